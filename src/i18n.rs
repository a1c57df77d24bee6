// SPDX-License-Identifier: GPL-3.0-only

//! Localization of user-visible key labels.
//!
//! Fluent resources live in `i18n/<lang>/multibook.ftl` and are embedded into
//! the binary. The `fl!` macro looks messages up in [`LANGUAGE_LOADER`].

use std::sync::LazyLock;

use i18n_embed::{
    fluent::{fluent_language_loader, FluentLanguageLoader},
    unic_langid::LanguageIdentifier,
    DefaultLocalizer, LanguageLoader, Localizer,
};
use rust_embed::RustEmbed;

/// Applies the requested languages to the global loader.
pub fn init(requested_languages: &[LanguageIdentifier]) {
    if let Err(why) = localizer().select(requested_languages) {
        tracing::error!("error while loading fluent localizations: {}", why);
    }
}

/// Selects a single locale by its tag (e.g. `"pl"` or `"en-US"`).
///
/// Unknown or malformed tags leave the fallback language in place.
pub fn select_locale(tag: &str) {
    match tag.parse::<LanguageIdentifier>() {
        Ok(lang) => init(&[lang]),
        Err(e) => tracing::warn!("ignoring invalid locale tag {:?}: {}", tag, e),
    }
}

/// Localizer over the embedded Fluent resources.
#[must_use]
pub fn localizer() -> Box<dyn Localizer> {
    Box::from(DefaultLocalizer::new(&*LANGUAGE_LOADER, &Localizations))
}

#[derive(RustEmbed)]
#[folder = "i18n/"]
struct Localizations;

pub static LANGUAGE_LOADER: LazyLock<FluentLanguageLoader> = LazyLock::new(|| {
    let loader: FluentLanguageLoader = fluent_language_loader!();

    if let Err(e) = loader.load_fallback_language(&Localizations) {
        tracing::error!("error while loading fallback language: {}", e);
    }

    loader
});

/// Request a localized string by ID from the i18n/ directory.
#[macro_export]
macro_rules! fl {
    ($message_id:literal) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id)
    }};

    ($message_id:literal, $($args:expr),*) => {{
        i18n_embed_fl::fl!($crate::i18n::LANGUAGE_LOADER, $message_id, $($args), *)
    }};
}
