use rocket::fairing::AdHoc;

pub mod account;
pub mod activity_log;
pub mod home;
pub mod ledger;
pub mod report;
pub mod senior;

pub fn mount() -> AdHoc {
    AdHoc::on_ignite("Attaching Routes", |rocket| async {
        rocket.mount(
            "/",
            routes![
                account::login,
                account::me,
                account::logout,
                senior::list,
                senior::get,
                senior::register,
                senior::archive,
                senior::restore,
                ledger::view,
                ledger::toggle,
                ledger::save_log,
                ledger::export,
                ledger::logs,
                report::range,
                report::range_export,
                report::seniors_export,
                activity_log::list,
                activity_log::statistics,
                activity_log::export,
                activity_log::clear,
                home::dashboard
            ],
        )
    })
}
