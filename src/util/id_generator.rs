use crate::text::chunking::{ChunkingError, Result};
use serde::Deserialize;
use snowflake::SnowflakeIdBucket;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// Source of chunk ids
///
/// Ids must be unique over a whole run, including runs split over several
/// workers, without the workers talking to each other.
pub trait IdGenerator: Send + Sync {
    fn generate(&self) -> Result<String>;

    fn name(&self) -> &'static str;
}

/// Random (v4) uuid: 122 random bits, no coordination needed
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidIdGenerator;

impl IdGenerator for UuidIdGenerator {
    fn generate(&self) -> Result<String> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    fn name(&self) -> &'static str {
        "uuid"
    }
}

/// Time ordered 64bit ids; unique as long as every process uses its own node id
#[derive(Clone)]
pub struct SnowflakeIdGenerator {
    bucket: Arc<Mutex<SnowflakeIdBucket>>,
    node_id: i32,
}

impl SnowflakeIdGenerator {
    // node_id: only lower 10bit is valid (5bit machine id + 5bit node id)
    pub fn new(node_id: i32) -> Self {
        let node_id = node_id & 0x3ff;
        let bucket = SnowflakeIdBucket::new(node_id >> 5, node_id & 0x1f);
        Self {
            bucket: Arc::new(Mutex::new(bucket)),
            node_id,
        }
    }

    /// Node id from the host ipv4 address (random if none is found)
    pub fn new_by_ip() -> Self {
        let node = iputil::resolve_host_node(10).unwrap_or_else(|| random_node(10));
        tracing::debug!("using node num for id generator: {}", node);
        Self::new(node as i32)
    }

    pub fn node_id(&self) -> i32 {
        self.node_id
    }
}

impl IdGenerator for SnowflakeIdGenerator {
    fn generate(&self) -> Result<String> {
        self.bucket
            .lock()
            .map(|mut bucket| bucket.get_id().to_string())
            .map_err(|e| ChunkingError::id_generation(format!("snowflake bucket poisoned: {e:?}")))
    }

    fn name(&self) -> &'static str {
        "snowflake"
    }
}

/// Sequential ids starting at 1, for tests
#[derive(Debug, Default)]
pub struct MockIdGenerator {
    next: AtomicU64,
}

impl MockIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }
}

impl IdGenerator for MockIdGenerator {
    fn generate(&self) -> Result<String> {
        Ok((self.next.fetch_add(1, Ordering::Relaxed) + 1).to_string())
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum IdScheme {
    #[default]
    Uuid,
    Snowflake,
}

/// `node_id` is only used by the snowflake scheme
pub fn new_generator(scheme: IdScheme, node_id: Option<i32>) -> Arc<dyn IdGenerator> {
    match scheme {
        IdScheme::Uuid => Arc::new(UuidIdGenerator),
        IdScheme::Snowflake => match node_id {
            Some(node_id) => Arc::new(SnowflakeIdGenerator::new(node_id)),
            None => Arc::new(SnowflakeIdGenerator::new_by_ip()),
        },
    }
}

// bit: smaller than 32
fn random_node(bit: u32) -> u32 {
    let n = ((1u32 << bit) - 1) & rand::random::<u32>();
    tracing::warn!("using random node num for id generator: {}", n);
    n
}

pub mod iputil {
    use once_cell::sync::Lazy;
    use pnet::{
        datalink,
        ipnetwork::{IpNetwork, Ipv4Network},
    };

    pub static IP_LOCAL: Lazy<Ipv4Network> = Lazy::new(|| "127.0.0.0/8".parse().unwrap());
    // loopback first, then private classes A/B/C; anything else counts as global
    static PREFERENCE: Lazy<[Ipv4Network; 4]> = Lazy::new(|| {
        [
            *IP_LOCAL,
            "10.0.0.0/8".parse().unwrap(),
            "172.16.0.0/12".parse().unwrap(),
            "192.168.0.0/16".parse().unwrap(),
        ]
    });

    /// `valid_bit`: max bit number for node
    pub fn resolve_host_node(valid_bit: u32) -> Option<u32> {
        resolve_host_ipv4().map(|a| host_node(a, valid_bit))
    }

    /// Highest priority ipv4 address of the host interfaces
    pub fn resolve_host_ipv4() -> Option<Ipv4Network> {
        let address = datalink::interfaces()
            .into_iter()
            .flat_map(|iface| iface.ips)
            .filter_map(|ip| match ip {
                IpNetwork::V4(v4) => Some(v4),
                IpNetwork::V6(_) => None,
            })
            .filter(|v4| priority(*v4) > 0)
            .max_by_key(|v4| priority(*v4));
        tracing::debug!("resolved host ip: {:?}", address);
        address
    }

    /// Host part of the address, masked to `valid_bit` bits
    pub fn host_node(ip: Ipv4Network, valid_bit: u32) -> u32 {
        let host_mask = ((0xffff_ffff_u64 >> ip.prefix()) as u32)
            .min(!(0xffff_ffff_u64 << valid_bit) as u32);
        u32::from(ip.ip()) & host_mask
    }

    fn priority(ip: Ipv4Network) -> usize {
        PREFERENCE
            .iter()
            .position(|net| net.contains(ip.ip()))
            .unwrap_or(PREFERENCE.len())
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn host_num_test() {
            assert_eq!(host_node("192.168.254.254/24".parse().unwrap(), 8), 254);
            assert_eq!(host_node("192.168.254.254/24".parse().unwrap(), 16), 254);
            // lower 10bit
            assert_eq!(host_node("192.168.254.254/16".parse().unwrap(), 10), 0x2fe);
            assert_eq!(host_node("10.1.2.3/8".parse().unwrap(), 10), 0x203);
        }

        #[test]
        fn priority_test() {
            assert_eq!(priority("127.0.0.1/8".parse().unwrap()), 0);
            assert_eq!(priority("10.168.254.254/14".parse().unwrap()), 1);
            assert_eq!(priority("172.16.254.254/12".parse().unwrap()), 2);
            assert_eq!(priority("192.168.254.254/24".parse().unwrap()), 3);
            assert_eq!(priority("12.168.254.254/24".parse().unwrap()), 4);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use itertools::Itertools;
    use std::collections::HashSet;
    use tokio::task::JoinSet;

    #[test]
    fn mock_ids_are_sequential() {
        let generator = MockIdGenerator::new();
        let ids = (0..3).map(|_| generator.generate().unwrap()).collect_vec();
        assert_eq!(ids, vec!["1", "2", "3"]);
    }

    #[test]
    fn uuid_ids_are_parseable() {
        let id = UuidIdGenerator.generate().unwrap();
        let parsed = uuid::Uuid::parse_str(&id).unwrap();
        assert_eq!(parsed.get_version_num(), 4);
    }

    #[test]
    fn snowflake_node_id_is_masked() {
        assert_eq!(SnowflakeIdGenerator::new(0x7ff).node_id(), 0x3ff);
        assert_eq!(SnowflakeIdGenerator::new(42).node_id(), 42);
    }

    #[test]
    fn scheme_from_env_string() {
        let vars = vec![("CHUNK_ID_SCHEME".to_string(), "snowflake".to_string())];
        #[derive(Deserialize)]
        struct Conf {
            id_scheme: IdScheme,
        }
        let conf: Conf = envy::prefixed("CHUNK_").from_iter(vars).unwrap();
        assert_eq!(conf.id_scheme, IdScheme::Snowflake);
        assert_eq!(new_generator(IdScheme::Uuid, None).name(), "uuid");
        assert_eq!(new_generator(IdScheme::Snowflake, Some(1)).name(), "snowflake");
    }

    #[tokio::test]
    async fn thread_safe_test() {
        for generator in [
            new_generator(IdScheme::Snowflake, Some(3)),
            new_generator(IdScheme::Uuid, None),
        ] {
            let mut set = JoinSet::new();
            for _ in 0..100 {
                let generator = generator.clone();
                set.spawn(async move {
                    (0..1000)
                        .map(|_| generator.generate().unwrap())
                        .collect_vec()
                });
            }

            let mut ids = HashSet::<String>::new();
            while let Some(res) = set.join_next().await {
                ids.extend(res.unwrap());
            }
            assert_eq!(ids.len(), 100 * 1000, "{}", generator.name());
        }
    }
}
