#[macro_use]
extern crate rust_i18n;

i18n!("locales");

use airules::cli;
use airules::error::AirulesError;
use airules::init_locale;

fn main() {
    init_locale();

    if let Err(e) = cli::run() {
        let message = e
            .downcast_ref::<AirulesError>()
            .map(AirulesError::display_localized)
            .unwrap_or_else(|| e.to_string());
        eprintln!("{}", t!("messages.error", error = message));
        std::process::exit(1);
    }
}
