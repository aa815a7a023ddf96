mod cli;
mod config;

use clap::Parser;
use cli::Cli;
use config::{ExportConfig, parse_yaml_file, validate_config};
use ipfix_exporter::{
    ElementRegistry, ExportError, ExportTime, FieldValue, MessageStream, Result, UdpSink,
};
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;
use std::net::{IpAddr, SocketAddr};

fn main() -> Result<()> {
    let args = Cli::parse();

    if args.verbose {
        println!("Loading export definition from {:?}", args.config);
    }

    let config = parse_yaml_file(&args.config)?;
    validate_config(&config)?;

    if args.verbose {
        println!(
            "Definition loaded: {} template(s), {} record(s)",
            config.templates.len(),
            config.records.len()
        );
    }

    let mut registry = ElementRegistry::with_iana_core();
    for spec in &config.elements {
        registry.register_spec(spec)?;
        if args.verbose {
            println!("Registered element {spec}");
        }
    }

    // CLI --mtu wins over the definition file
    let mtu = if args.mtu != 0 { args.mtu } else { config.mtu };

    if let Some(ref output_path) = args.output {
        if args.verbose {
            println!("Writing export to {output_path:?}");
        }
        let file = File::create(output_path)?;
        run_export(file, &config, &registry, mtu, args.verbose)?;
    } else {
        let destination = parse_destination(&args)?;
        if args.verbose {
            println!("Transmitting messages to {destination}");
        }
        let sink = UdpSink::connect(destination)?;
        run_export(sink, &config, &registry, mtu, args.verbose)?;
    }

    if args.verbose {
        println!("Done!");
    }

    Ok(())
}

fn run_export<W: Write>(
    sink: W,
    config: &ExportConfig,
    registry: &ElementRegistry,
    mtu: u16,
    verbose: bool,
) -> Result<()> {
    let mut stream = MessageStream::new(sink, mtu, config.observation_domain_id)?;
    let now = ExportTime::now();

    let mut template_ids: HashMap<&str, u16> = HashMap::new();
    for template in &config.templates {
        let elements = template
            .fields
            .iter()
            .map(|name| registry.lookup(name).cloned())
            .collect::<Result<Vec<_>>>()?;
        let id = stream.add_template(now, elements)?;
        template_ids.insert(template.name.as_str(), id);
        if verbose {
            println!("Template '{}' registered as {id}", template.name);
        }
    }

    for record in &config.records {
        // the validator checked every record references a known template
        let id = template_ids[record.template.as_str()];
        let values = record
            .values
            .iter()
            .map(yaml_value)
            .collect::<Result<Vec<_>>>()?;
        stream.send_data(now, id, &values)?;
    }

    stream.flush(now)?;

    if verbose {
        println!("Exported {} data record(s)", stream.sequence());
    }

    Ok(())
}

/// Convert a YAML value into a field value. Strings that parse as IP
/// addresses become addresses, everything else stays a string; the
/// template decides the final on-wire type.
fn yaml_value(value: &serde_yaml::Value) -> Result<FieldValue> {
    match value {
        serde_yaml::Value::Null => Ok(FieldValue::Null),
        serde_yaml::Value::Bool(b) => Ok(FieldValue::Bool(*b)),
        serde_yaml::Value::Number(n) => {
            if let Some(v) = n.as_u64() {
                Ok(FieldValue::Unsigned(v))
            } else if let Some(v) = n.as_i64() {
                Ok(FieldValue::Signed(v))
            } else if let Some(v) = n.as_f64() {
                Ok(FieldValue::Float(v))
            } else {
                Err(ExportError::Validation(format!("unsupported number {n:?}")))
            }
        }
        serde_yaml::Value::String(s) => {
            if let Ok(ip) = s.parse::<IpAddr>() {
                Ok(FieldValue::from(ip))
            } else {
                Ok(FieldValue::String(s.clone()))
            }
        }
        serde_yaml::Value::Sequence(items) => Ok(FieldValue::List(
            items.iter().map(yaml_value).collect::<Result<Vec<_>>>()?,
        )),
        other => Err(ExportError::Validation(format!(
            "unsupported record value {other:?}"
        ))),
    }
}

fn parse_destination(args: &Cli) -> Result<SocketAddr> {
    let dest = args.dest.as_deref().unwrap_or("127.0.0.1:4739");
    dest.parse().map_err(|e| {
        ExportError::Validation(format!("invalid destination '{dest}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn test_yaml_value_conversions() {
        assert_eq!(
            yaml_value(&serde_yaml::Value::Number(5.into())).unwrap(),
            FieldValue::Unsigned(5)
        );
        assert_eq!(
            yaml_value(&serde_yaml::Value::Number((-5).into())).unwrap(),
            FieldValue::Signed(-5)
        );
        assert_eq!(
            yaml_value(&serde_yaml::Value::String("192.168.0.1".to_string())).unwrap(),
            FieldValue::Ipv4(Ipv4Addr::new(192, 168, 0, 1))
        );
        assert_eq!(
            yaml_value(&serde_yaml::Value::String("dns".to_string())).unwrap(),
            FieldValue::String("dns".to_string())
        );
    }

    #[test]
    fn test_yaml_sequences_become_lists() {
        let value = serde_yaml::Value::Sequence(vec![
            serde_yaml::Value::Number(1.into()),
            serde_yaml::Value::Number(2.into()),
        ]);
        assert_eq!(
            yaml_value(&value).unwrap(),
            FieldValue::List(vec![FieldValue::Unsigned(1), FieldValue::Unsigned(2)])
        );
    }

    #[test]
    fn test_export_definition_round_trip() {
        let yaml = r#"
observation_domain_id: 7
templates:
  - name: flow
    fields: [octetDeltaCount, sourceIPv4Address]
records:
  - template: flow
    values: [5, "192.168.0.1"]
"#;
        let config = config::parse_yaml_str(yaml).unwrap();
        validate_config(&config).unwrap();

        let registry = ElementRegistry::with_iana_core();
        let mut out = Vec::new();
        run_export(&mut out, &config, &registry, 0, false).unwrap();

        ipfix_exporter::validation::validate_export(&out).unwrap();
        // version and total length in the message header
        assert_eq!(&out[..2], [0x00, 0x0a]);
        assert_eq!(u16::from_be_bytes([out[2], out[3]]) as usize, out.len());
    }
}
