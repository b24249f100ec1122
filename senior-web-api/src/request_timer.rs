use crate::pool::SeniorConfig;
use rocket::{
    fairing::{Fairing, Info, Kind},
    http::Status,
    Data, Request, Response,
};
use std::time::Instant;
use tracing::{info, warn};

pub struct RequestTimer;

#[derive(Clone)]
struct TimerStart(Option<Instant>);

fn enabled(request: &Request<'_>) -> bool {
    request
        .rocket()
        .state::<SeniorConfig>()
        .map(|config| config.enable_request_timer)
        .unwrap_or(false)
}

#[rocket::async_trait]
impl Fairing for RequestTimer {
    fn info(&self) -> Info {
        Info {
            name: "Request timer",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        if !enabled(request) || request.uri().path().as_str() == "/" {
            return;
        }
        request.local_cache(|| TimerStart(Some(Instant::now())));
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if !enabled(request) || request.uri().path().as_str() == "/" {
            return;
        }

        let start = match request.local_cache(|| TimerStart(None)) {
            TimerStart(Some(start)) => *start,
            TimerStart(None) => return,
        };
        let elapsed = start.elapsed();
        let status = response.status();
        if status.code >= Status::InternalServerError.code {
            warn!(
                "{} {} -> {} in {}ms",
                request.method(),
                request.uri().path(),
                status.code,
                elapsed.as_millis()
            );
        } else {
            info!(
                "{} {} -> {} in {}ms",
                request.method(),
                request.uri().path(),
                status.code,
                elapsed.as_millis()
            );
        }
    }
}
