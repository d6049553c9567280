use careline_agent::providers;
use careline_core::config::{AppConfig, LoadOptions};
use careline_core::prompts::PromptLibrary;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
enum CheckStatus {
    Pass,
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
                error.to_string().replace('"', "'")
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
            checks.push(check_prompt_templates(&config));
            checks.push(check_provider_reachability(&config));
        }
        Err(error) => {
            checks.push(DoctorCheck {
                name: "config_validation",
                status: CheckStatus::Fail,
                details: error.to_string(),
            });
            checks.push(DoctorCheck {
                name: "prompt_templates",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
            checks.push(DoctorCheck {
                name: "provider_reachability",
                status: CheckStatus::Skipped,
                details: "skipped because configuration did not load".to_string(),
            });
        }
    }

    let all_pass = checks.iter().all(|check| check.status == CheckStatus::Pass);
    let overall_status = if all_pass { CheckStatus::Pass } else { CheckStatus::Fail };
    let summary = if all_pass {
        "doctor: all readiness checks passed".to_string()
    } else {
        "doctor: one or more readiness checks failed".to_string()
    };

    DoctorReport { overall_status, summary, checks }
}

fn check_prompt_templates(config: &AppConfig) -> DoctorCheck {
    match PromptLibrary::load(&config.prompts.dir) {
        Ok(library) => {
            let missing = library.missing();
            if missing.is_empty() {
                DoctorCheck {
                    name: "prompt_templates",
                    status: CheckStatus::Pass,
                    details: format!("all templates present in {}", config.prompts.dir.display()),
                }
            } else {
                // Missing templates degrade stage quality but are not fatal
                // at runtime; doctor still flags them for the operator.
                DoctorCheck {
                    name: "prompt_templates",
                    status: CheckStatus::Fail,
                    details: format!("empty or missing templates: {}", missing.join(", ")),
                }
            }
        }
        Err(error) => DoctorCheck {
            name: "prompt_templates",
            status: CheckStatus::Fail,
            details: format!("prompt directory unreadable: {error}"),
        },
    }
}

fn check_provider_reachability(config: &AppConfig) -> DoctorCheck {
    let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime,
        Err(error) => {
            return DoctorCheck {
                name: "provider_reachability",
                status: CheckStatus::Fail,
                details: format!("could not build tokio runtime: {error}"),
            }
        }
    };

    match runtime.block_on(providers::probe(&config.llm)) {
        Ok(details) => {
            DoctorCheck { name: "provider_reachability", status: CheckStatus::Pass, details }
        }
        Err(error) => DoctorCheck {
            name: "provider_reachability",
            status: CheckStatus::Fail,
            details: format!("{error:#}"),
        },
    }
}

fn render_human(report: &DoctorReport) -> String {
    let mut lines = vec![report.summary.clone()];
    for check in &report.checks {
        let marker = match check.status {
            CheckStatus::Pass => "PASS",
            CheckStatus::Fail => "FAIL",
            CheckStatus::Skipped => "SKIP",
        };
        lines.push(format!("  [{marker}] {}: {}", check.name, check.details));
    }
    lines.join("\n")
}
