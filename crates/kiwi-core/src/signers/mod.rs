mod secret_key;

pub use secret_key::{
    mnemonic_to_secret_key, secret_key_to_address, sign_transaction, SecretKey, SecretSource,
    SignedTransaction,
};
