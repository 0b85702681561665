use serde::Serialize;
use std::{fmt, str::FromStr};

use crate::config::ConfigError;
use crate::opts::RecordFields;

/// The NITRO resource a record type maps onto.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceType {
    Address,
    Ipv6Address,
    Alias,
    MailExchange,
    Nameserver,
    StartOfAuthority,
    Service,
    Text,
}

impl ResourceType {
    /// Name of the resource in NITRO URLs and payloads.
    pub fn api_name(self) -> &'static str {
        match self {
            ResourceType::Address => "dnsaddrec",
            ResourceType::Ipv6Address => "dnsaaaarec",
            ResourceType::Alias => "dnscnamerec",
            ResourceType::MailExchange => "dnsmxrec",
            ResourceType::Nameserver => "dnsnsrec",
            ResourceType::StartOfAuthority => "dnssoarec",
            ResourceType::Service => "dnssrvrec",
            ResourceType::Text => "dnstxtrec",
        }
    }

    /// The flag holding the key an existing record is looked up by.
    pub fn lookup_flag(self) -> &'static str {
        match self {
            ResourceType::Address | ResourceType::Ipv6Address | ResourceType::Alias => "--hostname",
            _ => "--domain",
        }
    }
}

impl FromStr for ResourceType {
    type Err = ConfigError;

    fn from_str(keyword: &str) -> Result<Self, Self::Err> {
        match keyword.to_ascii_lowercase().as_str() {
            "a" => Ok(ResourceType::Address),
            "aaaa" => Ok(ResourceType::Ipv6Address),
            "cname" => Ok(ResourceType::Alias),
            "mx" => Ok(ResourceType::MailExchange),
            "ns" => Ok(ResourceType::Nameserver),
            "soa" => Ok(ResourceType::StartOfAuthority),
            "srv" => Ok(ResourceType::Service),
            "txt" => Ok(ResourceType::Text),
            _ => Err(ConfigError::UnsupportedRecordType(keyword.to_string())),
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_name())
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    pub hostname: String,
    pub ipaddress: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Ipv6AddressRecord {
    pub hostname: String,
    pub ipv6address: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AliasRecord {
    pub aliasname: String,
    pub canonicalname: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct MailExchangeRecord {
    pub domain: String,
    pub mx: String,
    pub pref: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct NameserverRecord {
    pub domain: String,
    pub nameserver: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct StartOfAuthorityRecord {
    pub domain: String,
    pub originserver: String,
    pub contact: String,
    pub serial: String,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceRecord {
    pub domain: String,
    pub target: String,
    pub priority: String,
    pub weight: String,
    pub port: String,
    pub ttl: u32,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct TextRecord {
    pub domain: String,
    #[serde(rename = "String")]
    pub string_list: Vec<String>,
    pub ttl: u32,
}

/// A record as it is sent to the appliance, one variant per resource type.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum Record {
    Address(AddressRecord),
    Ipv6Address(Ipv6AddressRecord),
    Alias(AliasRecord),
    MailExchange(MailExchangeRecord),
    Nameserver(NameserverRecord),
    StartOfAuthority(StartOfAuthorityRecord),
    Service(ServiceRecord),
    Text(TextRecord),
}

impl Record {
    pub fn resource_type(&self) -> ResourceType {
        match self {
            Record::Address(_) => ResourceType::Address,
            Record::Ipv6Address(_) => ResourceType::Ipv6Address,
            Record::Alias(_) => ResourceType::Alias,
            Record::MailExchange(_) => ResourceType::MailExchange,
            Record::Nameserver(_) => ResourceType::Nameserver,
            Record::StartOfAuthority(_) => ResourceType::StartOfAuthority,
            Record::Service(_) => ResourceType::Service,
            Record::Text(_) => ResourceType::Text,
        }
    }
}

/// The record for this run, along with the key used to find an existing instance of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordDescriptor {
    pub record: Record,
    pub lookup_key: String,
}

impl RecordDescriptor {
    pub fn resource_type(&self) -> ResourceType {
        self.record.resource_type()
    }
}

/// Builds the descriptor for `keyword` out of the parsed record flags.
///
/// Flags that were not given are sent as empty strings or zeroes, the appliance decides
/// whether the record is acceptable. `default_ttl` is used when `--ttl` was not given.
pub fn build_descriptor(
    keyword: &str,
    fields: &RecordFields,
    default_ttl: u32,
) -> Result<RecordDescriptor, ConfigError> {
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let number = |value: Option<u32>| value.unwrap_or_default();
    let ttl = fields.ttl.unwrap_or(default_ttl);
    let hostname = text(&fields.hostname);
    let domain = text(&fields.domain);

    let (record, lookup_key) = match keyword.parse::<ResourceType>()? {
        ResourceType::Address => (
            Record::Address(AddressRecord {
                hostname: hostname.clone(),
                ipaddress: text(&fields.ipaddress),
                ttl,
            }),
            hostname,
        ),
        ResourceType::Ipv6Address => (
            Record::Ipv6Address(Ipv6AddressRecord {
                hostname: hostname.clone(),
                ipv6address: text(&fields.ipv6address),
                ttl,
            }),
            hostname,
        ),
        ResourceType::Alias => (
            Record::Alias(AliasRecord {
                aliasname: hostname.clone(),
                canonicalname: text(&fields.canonicalname),
                ttl,
            }),
            hostname,
        ),
        ResourceType::MailExchange => (
            Record::MailExchange(MailExchangeRecord {
                domain: domain.clone(),
                mx: text(&fields.mx),
                pref: text(&fields.pref),
                ttl,
            }),
            domain,
        ),
        ResourceType::Nameserver => (
            Record::Nameserver(NameserverRecord {
                domain: domain.clone(),
                nameserver: text(&fields.nameserver),
                ttl,
            }),
            domain,
        ),
        ResourceType::StartOfAuthority => (
            Record::StartOfAuthority(StartOfAuthorityRecord {
                domain: domain.clone(),
                originserver: text(&fields.originserver),
                contact: text(&fields.contact),
                serial: text(&fields.serial),
                refresh: number(fields.refresh),
                retry: number(fields.retry),
                expire: number(fields.expire),
                minimum: number(fields.minimum),
                ttl,
            }),
            domain,
        ),
        ResourceType::Service => (
            Record::Service(ServiceRecord {
                domain: domain.clone(),
                target: text(&fields.target),
                priority: text(&fields.priority),
                weight: text(&fields.weight),
                port: text(&fields.port),
                ttl,
            }),
            domain,
        ),
        ResourceType::Text => (
            Record::Text(TextRecord {
                domain: domain.clone(),
                string_list: fields.txt_strings.clone(),
                ttl,
            }),
            domain,
        ),
    };

    Ok(RecordDescriptor { record, lookup_key })
}
