//! Service endpoints and client defaults.

/// Browser-like identification string sent with every request.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/94.0.4606.61 Safari/537.36";

/// Production service host.
pub const DEFAULT_HOSTNAME: &str = "www.mailinator.com";

/// Name of the anonymous session cookie issued by the service.
pub const SESSION_COOKIE: &str = "JSESSIONID";

/// Path of the public-mailbox notification socket.
pub const SOCKET_PATH: &str = "/ws/fetchpublic";

/// Path of the full-message fetch endpoint.
pub const FETCH_PATH: &str = "/fetch_public";

/// Delivery channel capacity. A single slot keeps delivery a rendezvous:
/// the loop parks until the consumer has taken the previous message.
pub const DELIVERY_BUFFER: usize = 1;
