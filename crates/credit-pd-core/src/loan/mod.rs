pub mod payment;

pub use payment::{amortized_payment, interest_only_payment, LoanPayments};
