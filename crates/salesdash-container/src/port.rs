use crate::error::{ContainerError, Result};
use std::io::ErrorKind;
use std::net::TcpListener;
use std::process::Command;
use tracing::{debug, warn};

/// PIDs of processes listening on `port` (best-effort, needs lsof)
pub fn find_pids_by_port(port: u16) -> Vec<i32> {
    let output = Command::new("lsof")
        .arg("-t")
        .arg(format!("-i:{}", port))
        .output();

    match output {
        Ok(out) if out.status.success() => String::from_utf8_lossy(&out.stdout)
            .lines()
            .filter_map(|line| line.trim().parse::<i32>().ok())
            .collect(),
        // lsof missing or nothing listening
        _ => vec![],
    }
}

/// Fail with [`ContainerError::PortAlreadyInUse`] if `port` cannot be bound
pub fn check_port_available(port: u16) -> Result<()> {
    match TcpListener::bind(("0.0.0.0", port)) {
        Ok(listener) => {
            drop(listener);
            debug!("port {} is free", port);
            Ok(())
        }
        Err(e) if e.kind() == ErrorKind::AddrInUse => {
            let pids = find_pids_by_port(port);
            if !pids.is_empty() {
                warn!("port {} is held by pid(s) {:?}", port, pids);
            }
            Err(ContainerError::PortAlreadyInUse { port })
        }
        Err(e) => Err(e.into()),
    }
}

/// Check every port, stopping at the first one that is taken
pub fn ensure_ports_available(ports: &[u16]) -> Result<()> {
    ports.iter().try_for_each(|port| check_port_available(*port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_port_passes() {
        let port = {
            let listener = TcpListener::bind(("0.0.0.0", 0)).unwrap();
            listener.local_addr().unwrap().port()
        };
        assert!(check_port_available(port).is_ok());
    }

    #[test]
    fn test_bound_port_is_rejected() {
        let listener = TcpListener::bind(("0.0.0.0", 0)).unwrap();
        let port = listener.local_addr().unwrap().port();

        match ensure_ports_available(&[port]) {
            Err(ContainerError::PortAlreadyInUse { port: p }) => assert_eq!(p, port),
            other => panic!("expected PortAlreadyInUse, got {:?}", other),
        }
    }
}
