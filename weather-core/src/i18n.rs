//! Localized client-facing messages.

/// Languages supported out of the box.
pub const DEFAULT_LANGUAGES: &[&str] = &["en", "de", "fr", "es", "it", "ru", "ar"];

/// Generic message for failures the client can't do anything about.
///
/// Falls back to English for languages without a translation.
pub fn try_again_later(language: &str) -> &'static str {
    match language {
        "de" => "Der Dienst ist derzeit nicht verfügbar. Bitte versuchen Sie es später erneut.",
        "fr" => "Le service est indisponible pour le moment. Veuillez réessayer plus tard.",
        "es" => "El servicio no está disponible en este momento. Inténtelo de nuevo más tarde.",
        "it" => "Il servizio non è al momento disponibile. Riprova più tardi.",
        "ru" => "Сервис временно недоступен. Пожалуйста, повторите попытку позже.",
        "ar" => "الخدمة غير متاحة حاليًا. يرجى المحاولة مرة أخرى لاحقًا.",
        _ => "Service is currently unavailable. Please try again later.",
    }
}
