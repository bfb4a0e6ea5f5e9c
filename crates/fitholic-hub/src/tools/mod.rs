//! Voice workout tools.

pub mod complete_session;
pub mod exercise_info;
pub mod help;
pub mod log_set;
pub mod navigate;
pub mod rest_timer;

use fitholic_core::tool::ToolRegistry;

pub use complete_session::CompleteSessionTool;
pub use exercise_info::ExerciseInfoTool;
pub use help::HelpTool;
pub use log_set::LogSetTool;
pub use navigate::NavigateExerciseTool;
pub use rest_timer::RestTimerTool;

/// Registry with every tool a voice command can name.
pub fn voice_tools() -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(LogSetTool::new());
    registry.register(NavigateExerciseTool::new());
    registry.register(CompleteSessionTool::new());
    registry.register(RestTimerTool::new());
    registry.register(ExerciseInfoTool::new());
    registry.register(HelpTool::new());
    registry
}
