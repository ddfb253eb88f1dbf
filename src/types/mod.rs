pub mod entry;
pub mod ids;
pub mod kind;
pub mod payment;
pub mod status;

pub use entry::{
    scale_payments, Difficulty, IssueFreeData, IssuePaymentData, TransactionData,
    TransactionPaymentData,
};
pub use ids::{AssetId, ClientNonce, Digest32, Owner, PayId, PayNonce, PeerId, ShareId, TxId};
pub use kind::{Issue, ShareGrant, ShareSwap, TransactionKind, TransferCountersigned, TransferUnratified};
pub use payment::{acceptable_payment, Payment, PaymentAlternative, PaymentDetail};
pub use status::TrackingStatus;
