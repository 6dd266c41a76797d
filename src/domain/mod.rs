mod comment;
mod links;
mod poem;

pub use comment::Comment;
pub use links::PoemLinks;
pub use poem::Poem;
