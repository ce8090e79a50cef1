use cartwise_core::config::{AppConfig, LoadOptions};
use cartwise_db::{connect_with_config, DbPool, PurchaseHistory};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
    Warn,
    Fail,
    Skipped,
}

#[derive(Debug, Serialize)]
struct DoctorCheck {
    name: &'static str,
    status: CheckStatus,
    details: String,
}

#[derive(Debug, Serialize)]
struct DoctorReport {
    overall_status: CheckStatus,
    summary: String,
    checks: Vec<DoctorCheck>,
}

pub fn run(json_output: bool) -> String {
    let report = build_report();

    if json_output {
        return serde_json::to_string_pretty(&report).unwrap_or_else(|error| {
            format!(
                "{{\"overall_status\":\"fail\",\"summary\":\"doctor serialization failed\",\"error\":\"{}\"}}",
                escape_json(&error.to_string())
            )
        });
    }

    render_human(&report)
}

fn build_report() -> DoctorReport {
    let mut checks = Vec::new();

    match AppConfig::load(LoadOptions::default()) {
        Ok(config) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Pass,
                details: "configuration loaded and validated".to_string(),
            });
            checks.push(check_mining_thresholds(&config));
            checks.extend(check_database(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            for name in ["mining_thresholds", "database_connectivity", "order_history"] {
                checks.push(DoctorCheck {
                    name,
                    status: CheckStatus::Skipped,
                    details: "skipped because configuration did not load".to_string(),
                });
            }
        }
    }

    summarize(checks)
}

fn summarize(checks: Vec<DoctorCheck>) -> DoctorReport {
    let any_fail = checks.iter().any(|check| check.status == CheckStatus::Fail);
    let overall_status = if any_fail { CheckStatus::Fail } else { CheckStatus::Pass };
    let summary = if any_fail {
        "doctor: one or more readiness checks failed".to_string()
    } else {
        "doctor: all readiness checks passed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_mining_thresholds(config: &AppConfig) -> DoctorCheck {
    let params = config.mining.params();
    match params.validate() {
        Ok(()) => DoctorCheck {
            name: "mining_thresholds",
            status: CheckStatus::Pass,
            details: format!(
                "min_support={} min_confidence={} counting={:?}",
                params.min_support, params.min_confidence, config.mining.counting
            ),
        },
        Err(error) => DoctorCheck {
            name: "mining_thresholds",
            status: CheckStatus::Fail,
            details: error.to_string(),
        },
    }
}

/// Connectivity, then whether enough delivered orders exist for mined results.
fn check_database(config: &AppConfig) -> Vec<DoctorCheck> {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return vec![
                DoctorCheck {
                    name: "database_connectivity",
                    status: CheckStatus::Fail,
                    details: format!("failed to initialize async runtime: {error}"),
                },
                skipped_history("database connectivity could not be checked"),
            ];
        }
    };

    runtime.block_on(async {
        let pool = match connect_with_config(&config.database).await {
            Ok(pool) => pool,
            Err(error) => {
                return vec![
                    DoctorCheck {
                        name: "database_connectivity",
                        status: CheckStatus::Fail,
                        details: format!("failed to connect to database: {error}"),
                    },
                    skipped_history("database is unreachable"),
                ];
            }
        };

        let transactions = count_transactions(&pool).await;
        pool.close().await;

        vec![
            DoctorCheck {
                name: "database_connectivity",
                status: CheckStatus::Pass,
                details: format!("connected using `{}`", config.database.url),
            },
            history_check(transactions, config.recommend.min_history),
        ]
    })
}

async fn count_transactions(pool: &DbPool) -> Result<usize, String> {
    let history = PurchaseHistory::load_from_pool(pool, 0)
        .await
        .map_err(|error| format!("order history unavailable: {error}"))?;
    Ok(history.transactions.len())
}

fn history_check(transactions: Result<usize, String>, min_history: usize) -> DoctorCheck {
    match transactions {
        Ok(count) if count >= min_history => DoctorCheck {
            name: "order_history",
            status: CheckStatus::Pass,
            details: format!("{count} transactions available for mining"),
        },
        Ok(count) => DoctorCheck {
            name: "order_history",
            status: CheckStatus::Warn,
            details: format!(
                "{count} transactions available, below the minimum of {min_history}; popular items will be served"
            ),
        },
        Err(details) => {
            DoctorCheck { name: "order_history", status: CheckStatus::Warn, details }
        }
    }
}

fn skipped_history(reason: &str) -> DoctorCheck {
    DoctorCheck {
        name: "order_history",
        status: CheckStatus::Skipped,
        details: format!("skipped because {reason}"),
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = Vec::new();
    lines.push(report.summary.clone());

    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "ok",
            CheckStatus::Warn => "warn",
            CheckStatus::Fail => "fail",
            CheckStatus::Skipped => "skip",
        };
        lines.push(format!("- [{marker}] {}: {}", check.name, check.details));
    }

    lines.join("\n")
}

fn escape_json(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
