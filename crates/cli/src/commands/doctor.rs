//! `agentloom doctor` — Diagnose configuration and back-end health.

use agentloom_config::AppConfig;
use agentloom_providers::OpenAiCompatProvider;
use agentloom_tools::builtin_catalog;

pub async fn run(write_config: bool) -> anyhow::Result<()> {
    println!("🩺 Agentloom Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    // Check config file
    let config_path = AppConfig::config_dir().join("config.toml");
    let config = if config_path.exists() {
        match AppConfig::load() {
            Ok(config) => match config.validate() {
                Ok(()) => {
                    println!("  ✅ Config file valid ({})", config_path.display());
                    config
                }
                Err(e) => {
                    println!("  ❌ Config file fails validation: {e}");
                    issues += 1;
                    AppConfig::default()
                }
            },
            Err(e) => {
                println!("  ❌ Config file invalid: {e}");
                issues += 1;
                AppConfig::default()
            }
        }
    } else if write_config {
        std::fs::create_dir_all(AppConfig::config_dir())?;
        std::fs::write(&config_path, AppConfig::default_toml())?;
        println!("  ✅ Wrote default config to {}", config_path.display());
        AppConfig::default()
    } else {
        println!("  ⚠️  No config file — using defaults (run with --write-config to create one)");
        issues += 1;
        AppConfig::default()
    };

    // Check the LLM back-end
    let provider = OpenAiCompatProvider::from_config(&config.llm)?;
    match provider.health_check().await {
        Ok(true) => println!(
            "  ✅ LLM back-end reachable at {} (model: {})",
            config.llm.base_url, config.llm.model
        ),
        Ok(false) => {
            println!(
                "  ⚠️  LLM back-end at {} answered with an error status",
                config.llm.base_url
            );
            issues += 1;
        }
        Err(e) => {
            println!(
                "  ❌ LLM back-end unreachable at {}: {e}",
                config.llm.base_url
            );
            issues += 1;
        }
    }

    // List builtin tools
    let catalog = builtin_catalog();
    println!("  ✅ {} builtin tools registered:", catalog.len());
    for spec in &catalog {
        println!("       {} — {}", spec.name, spec.purpose);
    }

    // Summary
    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
