pub mod catalog;
pub mod history;
pub mod module;
pub mod plan;
pub mod user;

pub use catalog::{Exercise, MusclePart, NewExercise};
pub use history::TrainHistory;
pub use module::{ModuleUpdate, NewTrainingModule, TrainingModule};
pub use plan::{NewTrainingPlan, PlanModule, PlanModuleEntry, TrainingPlan};
pub use user::User;
