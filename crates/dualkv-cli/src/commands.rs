use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use dualkv_datastore::{
    Datastore, DatastoreConfig, DualDatastore, Entry, Order, PersistentDatastore, Query, Queryable,
    Readable, Writable,
};
use dualkv_store::FsObjectStore;
use dualkv_types::{Key, ObjectId};
use serde_json::{json, Value};
use tracing::Level;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = DatastoreConfig::load(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    init_tracing(cli.verbose || config.trace);

    let format = cli.format;
    if let Command::Oid(args) = &cli.command {
        return cmd_oid(args, format);
    }

    let ds = open_datastore(&cli, &config)?;
    let outcome = match cli.command {
        Command::Put(args) => cmd_put(&ds, args, format),
        Command::Get(args) => cmd_get(&ds, args, format),
        Command::Has(args) => cmd_has(&ds, args, format),
        Command::Size(args) => cmd_size(&ds, args, format),
        Command::Delete(args) => cmd_delete(&ds, args, format),
        Command::Query(args) => cmd_query(&ds, args, format),
        Command::Du => cmd_du(&ds, format),
        Command::Oid(_) => Ok(()),
    };
    let closed = ds.close();
    outcome?;
    closed?;
    Ok(())
}

fn init_tracing(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    // A subscriber may already be installed when run from tests.
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .try_init();
}

fn open_datastore(cli: &Cli, config: &DatastoreConfig) -> anyhow::Result<DualDatastore> {
    let index = config.validate()?;
    let remote = FsObjectStore::open(&cli.object_dir, index, cli.create).with_context(|| {
        format!("opening object index {index} under {}", cli.object_dir.display())
    })?;
    Ok(DualDatastore::open(config, Arc::new(remote))?)
}

fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn entry_json(entry: &Entry) -> Value {
    let mut obj = json!({ "key": entry.key.to_string(), "size": entry.size });
    if let Some(value) = &entry.value {
        obj["value"] = Value::from(String::from_utf8_lossy(value).into_owned());
    }
    obj
}

fn cmd_put(ds: &DualDatastore, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = Key::new(&args.key);
    ds.put_with_overwrite(&key, args.value.as_bytes(), !args.no_overwrite)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "key": key.to_string(),
            "size": args.value.len(),
            "oid": ds.oid_of(&key).to_string(),
        })),
        OutputFormat::Text => {
            println!(
                "{} Stored {} ({} bytes)",
                "✓".green().bold(),
                key.to_string().yellow(),
                args.value.len()
            );
            Ok(())
        }
    }
}

fn cmd_get(ds: &DualDatastore, args: KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = Key::new(&args.key);
    let value = ds.get(&key)?;
    match format {
        OutputFormat::Json => print_json(&entry_json(&Entry {
            size: value.len() as u64,
            key,
            value: Some(value),
        })),
        OutputFormat::Text => {
            println!("{}", String::from_utf8_lossy(&value));
            Ok(())
        }
    }
}

fn cmd_has(ds: &DualDatastore, args: KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = Key::new(&args.key);
    let exists = ds.has(&key)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "key": key.to_string(), "exists": exists })),
        OutputFormat::Text => {
            let answer = if exists { "yes".green() } else { "no".red() };
            println!("{} {}", key.to_string().yellow(), answer);
            Ok(())
        }
    }
}

fn cmd_size(ds: &DualDatastore, args: KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = Key::new(&args.key);
    let size = ds.get_size(&key)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "key": key.to_string(), "size": size })),
        OutputFormat::Text => {
            println!("{size}");
            Ok(())
        }
    }
}

fn cmd_delete(ds: &DualDatastore, args: KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = Key::new(&args.key);
    ds.delete(&key)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "key": key.to_string(), "deleted": true })),
        OutputFormat::Text => {
            println!("{} Deleted {}", "✓".green().bold(), key.to_string().yellow());
            Ok(())
        }
    }
}

fn build_query(args: &QueryArgs) -> Query {
    let mut query = Query::new()
        .with_prefix(args.prefix.as_deref().unwrap_or("/"))
        .order(if args.desc { Order::ByKeyDescending } else { Order::ByKey })
        .limit(args.limit)
        .offset(args.offset);
    if args.keys_only {
        query = query.keys_only();
    }
    query
}

fn cmd_query(ds: &DualDatastore, args: QueryArgs, format: OutputFormat) -> anyhow::Result<()> {
    let results = ds.query(build_query(&args))?;
    match format {
        OutputFormat::Json => {
            let entries = results.rest()?;
            print_json(&Value::Array(entries.iter().map(entry_json).collect()))
        }
        OutputFormat::Text => {
            let mut count = 0usize;
            for entry in results {
                let entry = entry?;
                count += 1;
                let size = format!("{} bytes", entry.size);
                match &entry.value {
                    Some(value) => println!(
                        "{}  {}  {}",
                        entry.key.to_string().yellow(),
                        size.dimmed(),
                        String::from_utf8_lossy(value)
                    ),
                    None => println!("{}  {}", entry.key.to_string().yellow(), size.dimmed()),
                }
            }
            println!("{} entries", count.to_string().bold());
            Ok(())
        }
    }
}

fn cmd_du(ds: &DualDatastore, format: OutputFormat) -> anyhow::Result<()> {
    let bytes = ds.disk_usage()?;
    match format {
        OutputFormat::Json => print_json(&json!({ "disk_usage": bytes })),
        OutputFormat::Text => {
            println!("Local index: {} bytes", bytes.to_string().bold());
            Ok(())
        }
    }
}

fn cmd_oid(args: &KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = Key::new(&args.key);
    let oid = ObjectId::derive(key.as_bytes());
    match format {
        OutputFormat::Json => print_json(&json!({
            "key": key.to_string(),
            "oid": oid.to_string(),
            "hex": oid.to_hex(),
        })),
        OutputFormat::Text => {
            println!("{}  {}", oid.to_string().cyan(), oid.to_hex().dimmed());
            Ok(())
        }
    }
}
