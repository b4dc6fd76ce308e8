pub mod character;
pub mod play;
pub mod position;
pub mod conf;

pub use character::Character;
pub use play::{Line, Scene, Act, Play, ActSceneId};
pub use position::{Position, ProgressRecord};
pub use conf::Conf;
