//! Math operators

mod add;
mod multiply;
mod sum_list;

pub use add::AddOp;
pub use multiply::MultiplyOp;
pub use sum_list::SumListOp;
