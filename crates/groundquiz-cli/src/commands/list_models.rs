//! The `groundquiz list-models` command.

use anyhow::Result;

use groundquiz_core::traits::ModelInfo;
use groundquiz_providers::config::{load_config_from, ProviderConfig};
use groundquiz_providers::create_provider;
use groundquiz_providers::ollama::OllamaProvider;

use super::GlobalOpts;

pub async fn execute(opts: &GlobalOpts, provider_filter: Option<String>) -> Result<()> {
    let config = load_config_from(opts.config.as_deref())?;

    let mut names: Vec<&String> = config.providers.keys().collect();
    names.sort();

    let mut found_any = false;
    for name in names {
        if provider_filter.as_ref().is_some_and(|filter| filter != name) {
            continue;
        }

        let models = match models_for(name, &config.providers[name]).await {
            Ok(models) => models,
            Err(e) => {
                tracing::warn!(provider = %name, error = %e, "could not list models");
                println!("Provider: {name}\n  (unavailable: {e})\n");
                found_any = true;
                continue;
            }
        };

        found_any = true;
        let marker = if *name == config.default_provider {
            " (default)"
        } else {
            ""
        };
        println!("Provider: {name}{marker}");
        if models.is_empty() {
            println!("  (models are discovered at runtime)");
        }
        for model in &models {
            let selected = if model.id == config.default_model { " *" } else { "" };
            if model.max_context > 0 {
                println!(
                    "  {} - {} ({}K context){selected}",
                    model.id,
                    model.name,
                    model.max_context / 1000,
                );
            } else {
                println!("  {}{selected}", model.id);
            }
        }
        println!();
    }

    if !found_any {
        println!("No providers configured. Run `groundquiz init` or set GROQ_API_KEY.");
    }

    Ok(())
}

/// Static catalogue for hosted providers, live `/api/tags` lookup for Ollama.
async fn models_for(name: &str, provider: &ProviderConfig) -> Result<Vec<ModelInfo>> {
    match provider {
        ProviderConfig::Ollama { base_url } => {
            OllamaProvider::new(base_url).list_models_async().await
        }
        other => Ok(create_provider(name, other)?.available_models()),
    }
}
