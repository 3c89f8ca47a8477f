//! `aerobrain doctor`: Diagnose system health.

use aerobrain_config::AppConfig;
use aerobrain_core::provider::Provider;
use aerobrain_core::retrieval::{TenantId, VectorStore};

pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    println!("🩺 AeroBrain Doctor — System Diagnostics");
    println!("========================================\n");

    let mut issues = 0;

    let config_path = AppConfig::config_dir().join("config.toml");
    if config_path.exists() {
        println!("  ✅ Config file found at {}", config_path.display());
    } else {
        println!("  ℹ️  No config file, using defaults and environment");
    }

    let config = match AppConfig::load() {
        Ok(config) => {
            println!("  ✅ Configuration valid");
            config
        }
        Err(e) => {
            println!("  ❌ Configuration invalid: {e}");
            println!("\n  ⚠️  Cannot continue without a valid configuration.");
            return Ok(());
        }
    };

    match aerobrain_gateway::completion_provider(&config) {
        Some(provider) => {
            println!("  ✅ API key configured");
            match provider.health_check().await {
                Ok(true) => println!("  ✅ Completion endpoint reachable ({})", config.api_url),
                Ok(false) => {
                    println!("  ❌ Completion endpoint rejected the key ({})", config.api_url);
                    issues += 1;
                }
                Err(e) => {
                    println!("  ❌ Completion endpoint unreachable: {e}");
                    issues += 1;
                }
            }
        }
        None => {
            println!("  ⚠️  No API key configured — set OPENAI_API_KEY or AEROBRAIN_API_KEY");
            issues += 1;
        }
    }

    match aerobrain_gateway::open_vector_store(&config).await {
        Ok(store) => {
            let chunks = store.count(TenantId::default()).await.unwrap_or_default();
            println!(
                "  ✅ Document index open at {} ({chunks} chunk(s) for the default tenant)",
                config.vector_db_path
            );
        }
        Err(e) => {
            println!("  ❌ Document index unavailable: {e}");
            issues += 1;
        }
    }

    match aerobrain_store::SqliteFaultStore::new(&config.sqlite_path).await {
        Ok(_) => println!("  ✅ Fault history open at {}", config.sqlite_path),
        Err(e) => {
            println!("  ❌ Fault history unavailable: {e}");
            issues += 1;
        }
    }

    println!();
    if issues == 0 {
        println!("  🎉 All checks passed!");
    } else {
        println!("  ⚠️  {issues} issue(s) found. See above for details.");
    }

    Ok(())
}
