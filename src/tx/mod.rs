mod load;
mod record;

pub use load::{demo_transaction, load_transaction, parse_transaction};
pub use record::{AddressType, TxInput, TxOutput, TxRecord};
