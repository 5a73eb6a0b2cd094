//! Change notification: subscriptions, interest filtering and dispatch.

pub mod declaration;
pub mod dispatcher;
pub mod refresh;
pub mod subscriber;

pub use declaration::InterestDeclaration;
pub use dispatcher::{ChangeDispatcher, DispatchReport};
pub use refresh::{EnvironmentChange, RefreshPublisher};
pub use subscriber::{
    ChangeListener, InterestFilter, Subscription, SubscriptionHandle, SubscriptionRegistry,
};
