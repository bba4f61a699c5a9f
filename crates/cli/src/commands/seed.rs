use casevalue_db::{connect_with_config, migrations, DemoCorpus};

use crate::commands::{load_config, runtime, CommandFailure, CommandResult};

pub fn run() -> CommandResult {
    let result = load_config().and_then(|config| {
        runtime()?.block_on(async {
            let pool = connect_with_config(&config.database)
                .await
                .map_err(|error| ("db_connectivity", error.to_string(), 4u8))?;

            migrations::run_pending(&pool)
                .await
                .map_err(|error| ("migration", error.to_string(), 5u8))?;

            let seeded = DemoCorpus::load(&pool)
                .await
                .map_err(|error| ("seed_execution", error.to_string(), 5u8))?;

            let verification = DemoCorpus::verify(&pool)
                .await
                .map_err(|error| ("seed_verification", error.to_string(), 6u8))?;

            let outcome: Result<Vec<i64>, CommandFailure> = if verification.all_present {
                Ok(seeded.cases_seeded)
            } else {
                let failed_checks = verification
                    .checks
                    .iter()
                    .filter_map(|(check, passed)| (!passed).then_some(check.as_str()))
                    .collect::<Vec<_>>();
                Err(("seed_verification", verification_message(&failed_checks), 6u8))
            };

            pool.close().await;
            outcome
        })
    });

    match result {
        Ok(case_ids) => {
            let ids = case_ids.iter().map(i64::to_string).collect::<Vec<_>>();
            let message = format!(
                "demo corpus loaded with {} historical cases (ids {})",
                case_ids.len(),
                ids.join(", ")
            );
            CommandResult::success("seed", message)
        }
        Err(failure) => CommandResult::from_failure("seed", failure),
    }
}

fn verification_message(failed_checks: &[&str]) -> String {
    if failed_checks.is_empty() {
        "Some seed data failed to load".to_string()
    } else {
        format!("Seed verification failed for checks: {}", failed_checks.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::verification_message;

    #[test]
    fn verification_error_message_targets_failed_checks() {
        assert_eq!(
            verification_message(&["demo-case-9", "demo-case-12"]),
            "Seed verification failed for checks: demo-case-9, demo-case-12"
        );
    }

    #[test]
    fn verification_error_message_falls_back_to_generic_when_no_labels() {
        assert_eq!(verification_message(&[]), "Some seed data failed to load");
    }
}
