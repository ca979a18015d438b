//! Ports - interfaces between the domain and the outside world.

mod customer_repository;
mod event_repository;
mod payment_gateway;
mod user_directory;

pub use customer_repository::{CustomerRepository, GetOrCreate};
pub use event_repository::{EventRecord, EventRepository, ExceptionRecord, SaveResult};
pub use payment_gateway::{
    CreateCustomerRequest, CreateInvoiceItemRequest, CreateSubscriptionRequest, GatewayCard,
    GatewayCustomer, GatewayError, GatewayErrorCode, GatewayEvent, GatewayInvoice,
    GatewaySubscription, PaymentGateway,
};
pub use user_directory::{UserAttribute, UserDirectory};
