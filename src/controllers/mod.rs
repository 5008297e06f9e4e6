pub mod bills;
pub mod new_bill;

pub use bills::BillsController;
pub use new_bill::NewBillController;
