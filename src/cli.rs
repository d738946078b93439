//! Command-line front end. Every subcommand prints its result as JSON.

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::Value;

use crate::commands;
use crate::config::{AggregationScope, AppConfig};
use crate::db::{initialize_db, AppState};
use crate::models::{NewExercise, NewTrainingModule, NewTrainingPlan};

#[derive(Parser, Debug)]
#[command(
  name = "rpgym",
  about = "Strength training progression tracker",
  long_about = "Track training modules, record sessions and see per-muscle levels"
)]
pub struct Cli {
  /// Database URL override
  #[arg(long, global = true, env = "RPGYM_DATABASE_URL")]
  pub database_url: Option<String>,

  /// Enable verbose logging
  #[arg(long, short = 'v', global = true)]
  pub verbose: bool,

  #[command(subcommand)]
  pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
  /// Create the database file if needed and apply migrations
  Migrate,
  /// Look up a user by email, creating it when missing
  User {
    #[arg(long)]
    email: String,
    /// Move the user to this training cycle
    #[arg(long)]
    cycle: Option<i64>,
    #[arg(long)]
    body_weight: Option<f64>,
  },
  /// Replace the catalog and the user's data with the reference set
  Seed {
    #[arg(long)]
    user_id: i64,
  },
  /// List muscle parts
  Muscles,
  /// Add a muscle part
  MuscleCreate {
    #[arg(long)]
    name: String,
  },
  /// List exercises
  Exercises,
  /// Add an exercise to the catalog
  ExerciseCreate {
    #[arg(long)]
    name: String,
    #[arg(long)]
    max_weight: Decimal,
    #[arg(long)]
    muscle_part_id: Option<i64>,
  },
  /// List a user's training modules, newest first
  Modules {
    #[arg(long)]
    user_id: i64,
  },
  /// Create a training module; the series count follows the reps list
  ModuleCreate {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    exercise_id: i64,
    #[arg(long, default_value = "")]
    name: String,
    #[arg(long)]
    weight: Decimal,
    #[arg(long, default_value = "2.5")]
    level_weight_increase: Decimal,
    /// Target reps per series, e.g. 12,12,12,8
    #[arg(long, value_delimiter = ',', required = true)]
    reps: Vec<u32>,
  },
  /// Create a plan from module ids, in the given order
  PlanCreate {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    name: String,
    #[arg(long)]
    cycle: Option<i64>,
    #[arg(long, value_delimiter = ',')]
    modules: Vec<i64>,
  },
  /// Show the plan for the user's current cycle
  PlanCurrent {
    #[arg(long)]
    user_id: i64,
  },
  /// Mark a plan module as done, or clear the flag with --undo
  PlanModuleDone {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    plan_module_id: i64,
    #[arg(long)]
    undo: bool,
  },
  /// Record a performed session against a plan module
  Record {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    plan_module_id: i64,
    /// Reps performed per series, e.g. 8,8,8,8
    #[arg(long, value_delimiter = ',', required = true)]
    reps: Vec<u32>,
  },
  /// Show the session history of a plan module
  History {
    #[arg(long)]
    user_id: i64,
    #[arg(long)]
    plan_module_id: i64,
  },
  /// Per-muscle level and progress
  MuscleLevels {
    #[arg(long)]
    user_id: i64,
    /// plan or all; defaults to RPGYM_AGGREGATION_SCOPE
    #[arg(long)]
    scope: Option<AggregationScope>,
  },
}

fn to_json<T: Serialize>(result: Result<T, String>) -> Result<Value> {
  let value = result.map_err(anyhow::Error::msg)?;
  Ok(serde_json::to_value(value)?)
}

/// Run one command against an open state and return its JSON result
pub async fn dispatch(state: &mut AppState, command: Command) -> Result<Value> {
  match command {
    Command::Migrate => Ok(serde_json::json!({ "migrated": true })),
    Command::User {
      email,
      cycle,
      body_weight,
    } => {
      let mut user = commands::ensure_user(state, email).await.map_err(anyhow::Error::msg)?;
      if let Some(cycle) = cycle {
        user = commands::set_current_cycle(state, user.id, cycle)
          .await
          .map_err(anyhow::Error::msg)?;
      }
      if let Some(body_weight) = body_weight {
        user = commands::set_body_weight(state, user.id, body_weight)
          .await
          .map_err(anyhow::Error::msg)?;
      }
      Ok(serde_json::to_value(user)?)
    }
    Command::Seed { user_id } => to_json(commands::seed(state, user_id).await),
    Command::Muscles => to_json(commands::catalog::list_muscle_parts(state).await),
    Command::MuscleCreate { name } => to_json(commands::catalog::create_muscle_part(state, name).await),
    Command::Exercises => to_json(commands::catalog::list_exercises(state).await),
    Command::ExerciseCreate {
      name,
      max_weight,
      muscle_part_id,
    } => {
      let exercise = NewExercise {
        muscle_part_id,
        name,
        max_weight,
      };
      to_json(commands::catalog::create_exercise(state, exercise).await)
    }
    Command::Modules { user_id } => to_json(commands::training::list_modules(state, user_id).await),
    Command::ModuleCreate {
      user_id,
      exercise_id,
      name,
      weight,
      level_weight_increase,
      reps,
    } => {
      let module = NewTrainingModule {
        name,
        exercise_id,
        series: reps.len() as u32,
        weight,
        level_weight_increase,
        reps,
      };
      to_json(commands::training::create_module(state, user_id, module).await)
    }
    Command::PlanCreate {
      user_id,
      name,
      cycle,
      modules,
    } => {
      let plan = NewTrainingPlan { name, cycle, modules };
      to_json(commands::training::create_plan(state, user_id, plan).await)
    }
    Command::PlanCurrent { user_id } => to_json(commands::training::get_current_plan(state, user_id).await),
    Command::PlanModuleDone {
      user_id,
      plan_module_id,
      undo,
    } => to_json(commands::training::mark_plan_module_done(state, user_id, plan_module_id, !undo).await),
    Command::Record {
      user_id,
      plan_module_id,
      reps,
    } => to_json(commands::progression::record_session(state, user_id, plan_module_id, reps).await),
    Command::History {
      user_id,
      plan_module_id,
    } => to_json(commands::progression::get_history(state, user_id, plan_module_id).await),
    Command::MuscleLevels { user_id, scope } => {
      if let Some(scope) = scope {
        state.config.aggregation_scope = scope;
      }
      to_json(commands::progression::get_muscle_levels(state, user_id).await)
    }
  }
}

/// Open the pool, run one parsed command and print its result
pub async fn execute(cli: Cli, mut config: AppConfig) -> Result<()> {
  if let Some(url) = cli.database_url {
    config.database_url = url;
  }

  let db = initialize_db(&config)
    .await
    .map_err(|e| anyhow!("Failed to initialize database: {}", e))?;
  let mut state = AppState { db, config };

  let result = dispatch(&mut state, cli.command).await;
  state.db.close().await;

  println!("{}", serde_json::to_string_pretty(&result?)?);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::commands::test_state::setup_test_state;
  use serial_test::serial;

  fn parse(args: &[&str]) -> Command {
    Cli::try_parse_from(args.iter().copied()).expect("Should parse").command
  }

  #[test]
  fn test_parse_record_reps() {
    match parse(&["rpgym", "record", "--user-id", "1", "--plan-module-id", "4", "--reps", "8,8,3"]) {
      Command::Record {
        user_id,
        plan_module_id,
        reps,
      } => {
        assert_eq!(user_id, 1);
        assert_eq!(plan_module_id, 4);
        assert_eq!(reps, vec![8, 8, 3]);
      }
      other => panic!("Unexpected command: {:?}", other),
    }
  }

  #[test]
  #[serial]
  fn test_parse_scope_and_global_flags() {
    temp_env::with_var_unset("RPGYM_DATABASE_URL", || {
      let cli = Cli::try_parse_from([
        "rpgym",
        "muscle-levels",
        "--user-id",
        "2",
        "--scope",
        "all",
        "--database-url",
        "sqlite::memory:",
      ])
      .unwrap();

      assert_eq!(cli.database_url.as_deref(), Some("sqlite::memory:"));
      match cli.command {
        Command::MuscleLevels { scope, .. } => assert_eq!(scope, Some(AggregationScope::AllModules)),
        other => panic!("Unexpected command: {:?}", other),
      }
    });
  }

  #[test]
  #[serial]
  fn test_database_url_read_from_env() {
    temp_env::with_var("RPGYM_DATABASE_URL", Some("sqlite://from-env.db"), || {
      let cli = Cli::try_parse_from(["rpgym", "muscles"]).unwrap();
      assert_eq!(cli.database_url.as_deref(), Some("sqlite://from-env.db"));

      let flagged = Cli::try_parse_from(["rpgym", "muscles", "--database-url", "sqlite::memory:"]).unwrap();
      assert_eq!(flagged.database_url.as_deref(), Some("sqlite::memory:"));
    });
  }

  #[test]
  fn test_parse_module_create_defaults() {
    match parse(&[
      "rpgym",
      "module-create",
      "--user-id",
      "1",
      "--exercise-id",
      "3",
      "--weight",
      "37.5",
      "--reps",
      "12,12,8",
    ]) {
      Command::ModuleCreate {
        name,
        weight,
        level_weight_increase,
        reps,
        ..
      } => {
        assert_eq!(name, "");
        assert_eq!(weight, Decimal::new(375, 1));
        assert_eq!(level_weight_increase, Decimal::new(25, 1));
        assert_eq!(reps.len(), 3);
      }
      other => panic!("Unexpected command: {:?}", other),
    }
  }

  #[test]
  fn test_parse_rejects_bad_input() {
    assert!(Cli::try_parse_from(["rpgym", "record", "--user-id", "1", "--plan-module-id", "4"]).is_err());
    assert!(Cli::try_parse_from(["rpgym", "muscle-levels", "--user-id", "1", "--scope", "some"]).is_err());
    assert!(Cli::try_parse_from([
      "rpgym",
      "exercise-create",
      "--name",
      "Klata sztanga",
      "--max-weight",
      "heavy"
    ])
    .is_err());
  }

  #[tokio::test]
  async fn test_dispatch_builds_data_from_scratch() {
    let mut state = setup_test_state().await;

    let user = dispatch(&mut state, parse(&["rpgym", "user", "--email", "test@wp.pl"]))
      .await
      .unwrap();
    let user_id = user["id"].as_i64().unwrap().to_string();

    let muscle = dispatch(&mut state, parse(&["rpgym", "muscle-create", "--name", "biceps"]))
      .await
      .unwrap();
    let muscle_id = muscle["id"].as_i64().unwrap().to_string();

    let exercise = dispatch(
      &mut state,
      parse(&[
        "rpgym",
        "exercise-create",
        "--name",
        "Biceps sztanga",
        "--max-weight",
        "150",
        "--muscle-part-id",
        muscle_id.as_str(),
      ]),
    )
    .await
    .unwrap();
    let exercise_id = exercise["id"].as_i64().unwrap().to_string();

    let module = dispatch(
      &mut state,
      parse(&[
        "rpgym",
        "module-create",
        "--user-id",
        user_id.as_str(),
        "--exercise-id",
        exercise_id.as_str(),
        "--name",
        "t1",
        "--weight",
        "35",
        "--reps",
        "12,12,12,8",
      ]),
    )
    .await
    .unwrap();
    assert_eq!(module["current_level"], 23);
    let module_id = module["id"].as_i64().unwrap().to_string();

    let plan = dispatch(
      &mut state,
      parse(&[
        "rpgym",
        "plan-create",
        "--user-id",
        user_id.as_str(),
        "--name",
        "plan1",
        "--cycle",
        "0",
        "--modules",
        module_id.as_str(),
      ]),
    )
    .await
    .unwrap();
    let plan_module_id = plan["modules"][0]["plan_module_id"].as_i64().unwrap().to_string();

    let done = dispatch(
      &mut state,
      parse(&[
        "rpgym",
        "plan-module-done",
        "--user-id",
        user_id.as_str(),
        "--plan-module-id",
        plan_module_id.as_str(),
      ]),
    )
    .await
    .unwrap();
    assert_eq!(done["done"], true);

    let current = dispatch(&mut state, parse(&["rpgym", "plan-current", "--user-id", user_id.as_str()]))
      .await
      .unwrap();
    assert_eq!(current["status"], "matched");

    let recorded = dispatch(
      &mut state,
      parse(&[
        "rpgym",
        "record",
        "--user-id",
        user_id.as_str(),
        "--plan-module-id",
        plan_module_id.as_str(),
        "--reps",
        "8,8,8,8",
      ]),
    )
    .await
    .unwrap();
    assert_eq!(recorded["outcome"]["outcome"], "shortfall");

    let levels = dispatch(&mut state, parse(&["rpgym", "muscle-levels", "--user-id", user_id.as_str()]))
      .await
      .unwrap();
    assert_eq!(levels[0]["muscle_name"], "biceps");
    assert_eq!(levels[0]["level"], 23);
    assert_eq!(levels[0]["progress"].as_f64(), Some(0.27));
  }

  #[tokio::test]
  async fn test_dispatch_reports_command_errors() {
    let mut state = setup_test_state().await;
    let err = dispatch(
      &mut state,
      parse(&["rpgym", "plan-module-done", "--user-id", "1", "--plan-module-id", "9"]),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Plan module not found: 9");

    let err = dispatch(
      &mut state,
      parse(&["rpgym", "history", "--user-id", "1", "--plan-module-id", "9"]),
    )
    .await
    .unwrap_err();
    assert_eq!(err.to_string(), "Plan module not found: 9");
  }

  #[tokio::test]
  #[serial]
  async fn test_execute_migrate_against_memory_db() {
    let config = AppConfig {
      database_url: "sqlite::memory:".to_string(),
      max_connections: 1,
      ..AppConfig::default()
    };
    let cli = temp_env::with_var_unset("RPGYM_DATABASE_URL", || Cli::try_parse_from(["rpgym", "migrate"]).unwrap());
    execute(cli, config).await.expect("Migrate should succeed");
  }
}
