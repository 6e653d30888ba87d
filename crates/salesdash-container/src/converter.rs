//! ServiceSpec to container runtime CLI arguments

use salesdash_core::ServiceSpec;

/// Arguments for `<runtime> run` that start `service` detached
///
/// Layout: `run -d [--rm] --name <name> --network <network> [-e K=V]... [-p host:container]... <image>`
pub fn service_to_run_args(service: &ServiceSpec) -> Vec<String> {
    let mut args = vec!["run".to_string(), "-d".to_string()];

    if service.auto_remove {
        args.push("--rm".to_string());
    }

    args.push("--name".to_string());
    args.push(service.name.clone());
    args.push("--network".to_string());
    args.push(service.network.clone());

    for (key, value) in &service.environment {
        args.push("-e".to_string());
        args.push(format!("{}={}", key, value));
    }

    for port in &service.ports {
        args.push("-p".to_string());
        args.push(port.to_string());
    }

    args.push(service.image.clone());
    args
}
