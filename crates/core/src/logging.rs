//! Système de logging pour Amorce Core

use tracing_subscriber::{fmt, EnvFilter};

/// Initialise le système de logging
pub fn init_logging() {
    fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_thread_ids(true)
        .with_thread_names(true)
        .init();
}

/// Comme `init_logging`, mais sans paniquer si un subscriber est déjà installé
pub fn try_init_logging(default_level: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .is_ok()
}

/// Macro pour le logging des étapes du pipeline
#[macro_export]
macro_rules! log_operation {
    ($name:expr, $block:block) => {{
        let span = tracing::span!(tracing::Level::INFO, $name);
        let _enter = span.enter();
        tracing::info!("Début de l'étape: {}", $name);
        let result = $block;
        tracing::info!("Fin de l'étape: {}", $name);
        result
    }};
}

/// Macro pour le logging des erreurs
#[macro_export]
macro_rules! log_error {
    ($error:expr) => {{
        tracing::error!("Erreur: {}", $error);
        $error
    }};
}
