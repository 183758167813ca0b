use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use log::info;
use warp::Filter;

use super::routes::{
    dashboard_route, get_capture_route, list_captures_route, status_route, trigger_route,
};
use crate::controller::TriggerController;
use crate::error_handling::types::WebError;

/// Web server for the status dashboard and on-demand triggers
pub struct WebServer {
    controller: Arc<TriggerController>,
}

impl WebServer {
    pub fn new(controller: Arc<TriggerController>) -> Self {
        Self { controller }
    }

    /// Serves until the surrounding task is dropped.
    pub async fn start(&self, bind_address: &str, port: u16) -> Result<(), WebError> {
        let addr = socket_addr(bind_address, port)?;
        let status = self.controller.status();

        let routes = dashboard_route(status.clone())
            .or(status_route(status))
            .or(trigger_route(self.controller.clone()))
            .or(list_captures_route(self.controller.clone()))
            .or(get_capture_route(self.controller.clone()));

        info!("Web interface listening on http://{}", addr);
        warp::serve(routes).run(addr).await;
        Ok(())
    }
}

pub fn socket_addr(bind_address: &str, port: u16) -> Result<SocketAddr, WebError> {
    let ip: IpAddr = bind_address
        .parse()
        .map_err(|e| WebError::BindFailed(format!("invalid bind address '{}': {}", bind_address, e)))?;
    Ok(SocketAddr::new(ip, port))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_addr() {
        assert_eq!(
            socket_addr("0.0.0.0", 5000).unwrap(),
            SocketAddr::from(([0, 0, 0, 0], 5000))
        );
        assert_eq!(socket_addr("::1", 8080).unwrap().port(), 8080);
        assert!(matches!(
            socket_addr("localhost", 80),
            Err(WebError::BindFailed(_))
        ));
    }
}
