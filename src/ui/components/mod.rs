mod cat_modal;
mod command_input;
mod input;
mod key_result;

pub use cat_modal::render_overlay as render_cat_modal;
pub use command_input::CommandInput;
pub use input::{InputResult, TextInput};
pub use key_result::KeyResult;
