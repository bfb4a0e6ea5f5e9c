pub mod exercise;
pub mod workout;

pub use exercise::LlmExerciseGenerator;
pub use workout::LlmWorkoutGenerator;
