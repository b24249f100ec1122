use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::{Header, Status};
use rocket::{Request, Response};
use std::collections::HashSet;

pub struct OriginHeader {
    pub allowed_domains: HashSet<String>,
}

impl OriginHeader {
    /// Allow-list from a comma separated setting. Blank items are ignored.
    pub fn from_setting(setting: &str) -> OriginHeader {
        OriginHeader {
            allowed_domains: setting
                .split(',')
                .map(|domain| domain.trim().trim_end_matches('/'))
                .filter(|domain| !domain.is_empty())
                .map(|domain| domain.to_owned())
                .collect(),
        }
    }
}

#[rocket::async_trait]
impl Fairing for OriginHeader {
    fn info(&self) -> Info {
        Info {
            name: "CORS Policy",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if response.status() == Status::NotFound {
            return;
        }

        match request.headers().get_one("Origin") {
            None => {}
            Some(origin) => {
                if self.allowed_domains.contains(origin) {
                    response.set_header(Header::new("Access-Control-Allow-Origin", origin));
                    response.set_header(Header::new(
                        "Access-Control-Allow-Methods",
                        "GET, POST, DELETE",
                    ));
                    response.set_header(Header::new(
                        "Access-Control-Allow-Headers",
                        "Authorization, Content-Type",
                    ));
                }
            }
        };
    }
}
