use redis::Client;

/// Creates a Redis client for provider response caching
///
/// Connections are established lazily; opening the client only validates
/// the URL.
pub fn create_redis_client(redis_url: &str) -> anyhow::Result<Client> {
    let client = Client::open(redis_url)?;
    Ok(client)
}
