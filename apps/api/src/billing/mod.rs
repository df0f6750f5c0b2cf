// Stripe billing: subscription state, checkout/portal sessions, and the webhook that
// keeps `subscriptions` in sync with Stripe.

pub mod handlers;
pub mod repo;
pub mod signature;
pub mod stripe;
pub mod webhook;
