use crate::pool::SeniorConfig;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::{uri::Origin, Method},
    Data, Request,
};
use tracing::{info, warn};

pub struct MaintenanceMode;

#[rocket::async_trait]
impl Fairing for MaintenanceMode {
    fn info(&self) -> Info {
        Info {
            name: "Maintenance Mode",
            kind: Kind::Request,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let enabled = request
            .rocket()
            .state::<SeniorConfig>()
            .map(|config| config.enable_maintenance)
            .unwrap_or(false);
        if !enabled || request.uri().path().as_str() == "/" {
            return;
        }
        match Origin::parse("/maintenance_mode") {
            Ok(uri) => {
                request.set_uri(uri);
                request.set_method(Method::Get);
                info!("URI: {}", request.uri());
            }
            Err(error) => warn!("Maintenance route is not a valid URI: {}", error),
        }
    }
}
