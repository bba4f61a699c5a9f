use casevalue_db::{connect_with_config, migrations};

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
            pool.close().await;
            Ok::<(), CommandFailure>(())
        })
    });

    match result {
        Ok(()) => CommandResult::success("migrate", "applied pending migrations"),
        Err(failure) => CommandResult::from_failure("migrate", failure),
    }
}
