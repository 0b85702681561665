use clap::{Args, Parser};

use crate::nitro::Operation;

const EXAMPLES: &str = "\
Examples:
  nitro-dns --rrtype a --action ADD --hostname example.com --ipaddress 192.0.2.1 --ttl 300
  nitro-dns --rrtype aaaa --action ADD --hostname example.com --ipv6address 2001:db8::1 --ttl 300
  nitro-dns --rrtype cname --action ADD --hostname alias.example.com --canonicalname canonical.example.com --ttl 300
  nitro-dns --rrtype mx --action ADD --domain example.com --mx mail.example.com --pref 10 --ttl 300
  nitro-dns --rrtype ns --action ADD --domain example.com --nameserver ns1.example.com --ttl 300
  nitro-dns --rrtype soa --action ADD --domain example.com --originserver ns1.example.com \\
      --contact admin.example.com --serial 2023032001 --refresh 3600 --retry 600 \\
      --expire 1209600 --minimum 300 --ttl 300
  nitro-dns --rrtype srv --action ADD --domain _service._tcp.example.com --target target.example.com \\
      --priority 10 --weight 5 --port 80 --ttl 300
  nitro-dns --rrtype txt --action ADD --domain example.com --txt-string \"v=spf1 include:_spf.example.com ~all\" --ttl 300
  nitro-dns --rrtype a --action DELETE --hostname example.com
  nitro-dns --rrtype mx --action GET";

/// Create, delete and list DNS records on NITRO-managed appliances.
///
/// Every appliance listed in the token file receives the same request, one after the other.
/// The token file holds one `"address","account","secret"` line per appliance.
#[derive(Parser, Debug, Default)]
#[clap(author, version, about, name = "nitro-dns", after_long_help = EXAMPLES)]
pub struct Opts {
    /// Record type to operate on: a, aaaa, cname, mx, ns, soa, srv or txt.
    #[clap(long)]
    pub rrtype: Option<String>,
    /// Action to perform: ADD, DELETE or GET.
    #[clap(long, default_value = "GET")]
    pub action: Operation,
    /// The token file listing the appliances and their credentials.
    ///
    /// Defaults to `token_file` from the configuration file, then to `nstoken.txt`.
    #[clap(short = 'f', long)]
    pub token_file: Option<String>,
    /// The path to the configuration file.
    #[clap(long)]
    pub config: Option<String>,
    #[clap(flatten)]
    pub fields: RecordFields,
}

/// Per-record values. Only the ones relevant to the selected record type are sent.
#[derive(Args, Debug, Default, Clone)]
pub struct RecordFields {
    /// Hostname for A and AAAA records, alias name for CNAME records.
    #[clap(long)]
    pub hostname: Option<String>,
    /// IPv4 address for A records.
    #[clap(long)]
    pub ipaddress: Option<String>,
    /// IPv6 address for AAAA records.
    #[clap(long)]
    pub ipv6address: Option<String>,
    /// Canonical name for CNAME records.
    #[clap(long)]
    pub canonicalname: Option<String>,
    /// Domain for MX, NS, SOA, SRV and TXT records.
    #[clap(long)]
    pub domain: Option<String>,
    /// Mail exchanger for MX records.
    #[clap(long)]
    pub mx: Option<String>,
    /// Preference for MX records.
    #[clap(long)]
    pub pref: Option<String>,
    /// Name server for NS records.
    #[clap(long)]
    pub nameserver: Option<String>,
    /// Origin server for SOA records.
    #[clap(long)]
    pub originserver: Option<String>,
    /// Contact for SOA records.
    #[clap(long)]
    pub contact: Option<String>,
    /// Serial for SOA records.
    #[clap(long)]
    pub serial: Option<String>,
    /// Refresh interval for SOA records.
    #[clap(long)]
    pub refresh: Option<u32>,
    /// Retry interval for SOA records.
    #[clap(long)]
    pub retry: Option<u32>,
    /// Expiry for SOA records.
    #[clap(long)]
    pub expire: Option<u32>,
    /// Minimum TTL for SOA records.
    #[clap(long)]
    pub minimum: Option<u32>,
    /// Target for SRV records.
    #[clap(long)]
    pub target: Option<String>,
    /// Priority for SRV records.
    #[clap(long)]
    pub priority: Option<String>,
    /// Weight for SRV records.
    #[clap(long)]
    pub weight: Option<String>,
    /// Port for SRV records.
    #[clap(long)]
    pub port: Option<String>,
    /// Text content for TXT records.
    ///
    /// Can be given multiple times, every value becomes one string of the record.
    #[clap(long = "txt-string", alias = "txtString")]
    pub txt_strings: Vec<String>,
    /// TTL for all record types.
    ///
    /// Defaults to `ttl` from the configuration file, then to 0.
    #[clap(long)]
    pub ttl: Option<u32>,
}

#[cfg(test)]
mod tests {
    use clap::{CommandFactory, Parser};

    use super::Opts;
    use crate::nitro::Operation;

    #[test]
    fn command_is_well_formed() {
        Opts::command().debug_assert();
    }

    #[test]
    fn repeated_txt_strings() {
        let opts = Opts::try_parse_from([
            "nitro-dns",
            "--rrtype",
            "txt",
            "--action",
            "ADD",
            "--domain",
            "example.com",
            "--txt-string",
            "first",
            "--txtString",
            "second",
            "-f",
            "tokens.txt",
        ])
        .expect("Failed to parse arguments");
        assert_eq!(opts.action, Operation::Create);
        assert_eq!(opts.fields.txt_strings, vec!["first", "second"]);
        assert_eq!(opts.token_file.as_deref(), Some("tokens.txt"));
    }

    #[test]
    fn action_defaults_to_get() {
        let opts = Opts::try_parse_from(["nitro-dns", "--rrtype", "a"]).unwrap();
        assert_eq!(opts.action, Operation::List);
        assert_eq!(opts.fields.ttl, None);
    }

    #[test]
    fn unknown_action_is_rejected() {
        assert!(Opts::try_parse_from(["nitro-dns", "--rrtype", "a", "--action", "PATCH"]).is_err());
    }
}
