use super::{arg, confirm, Command, CommandOption};
use crate::fields;
use crate::mreg::context::Context;
use crate::mreg::error::{CliError, Result};
use crate::mreg::util::{flag_value, plain, query_string, Fields};
use crate::mreg::validate::{is_valid_network, network_contains};
use ipnetwork::IpNetwork;
use serde_json::Value;
use std::net::IpAddr;
use std::str::FromStr;

const PERMISSIONS: &str = "/permissions/netgroupregex/";

pub fn command() -> Command {
    Command {
        name: "permission",
        description: "Manage permissions.",
        options: vec![
            CommandOption {
                name: "network_list",
                usage: "network_list [-group <group>] [-range <range>]",
                help: "List permissions for networks",
                handler: network_list,
            },
            CommandOption {
                name: "network_add",
                usage: "network_add <range> <group> <regex>",
                help: "Add permission for network",
                handler: network_add,
            },
            CommandOption {
                name: "network_remove",
                usage: "network_remove <range> <group> <regex>",
                help: "Remove permission for network",
                handler: network_remove,
            },
        ],
    }
}

/// Orders IPv4 ranges before IPv6 ranges, each by network address.
fn range_key(perm: &Value) -> (bool, u128, u8) {
    match IpNetwork::from_str(&plain(&perm["range"])) {
        Ok(net) => {
            let addr = match net.network() {
                IpAddr::V4(a) => u32::from(a) as u128,
                IpAddr::V6(a) => u128::from(a),
            };
            (net.is_ipv6(), addr, net.prefix())
        }
        Err(_) => (true, u128::MAX, u8::MAX),
    }
}

fn network_list(ctx: &mut Context, args: &[String]) -> Result<()> {
    let range = flag_value(args, "-range");
    if let Some(r) = range {
        if !is_valid_network(r) {
            return Err(CliError::warning(format!("invalid range: {}", r)));
        }
    }
    let mut query = vec![("ordering", "group")];
    if let Some(g) = flag_value(args, "-group") {
        query.push(("group", g));
    }
    let url = ctx.url(&format!("{}?{}", PERMISSIONS, query_string(query)));
    let mut perms = ctx.get_list(&url)?;
    if let Some(r) = range {
        perms.retain(|p| network_contains(r, &plain(&p["range"])));
    }
    if perms.is_empty() {
        confirm("No permissions found");
        return Ok(());
    }
    perms.sort_by_key(range_key);

    println!("{:<20}{:<16} {}", "Range", "Group", "Regex");
    for p in &perms {
        println!(
            "{:<20}{:<16} {}",
            plain(&p["range"]),
            plain(&p["group"]),
            plain(&p["regex"])
        );
    }
    Ok(())
}

fn network_add(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "permission network_add <range> <group> <regex>";
    let range = arg(args, 0, usage)?;
    let group = arg(args, 1, usage)?;
    let regex = arg(args, 2, usage)?;
    if !is_valid_network(range) {
        return Err(CliError::warning(format!("invalid range: {}", range)));
    }
    let data = fields! { "range" => range, "group" => group, "regex" => regex };
    let url = ctx.url(PERMISSIONS);
    // the id of the new permission is only known to the server
    ctx.post(&url, "", data, false, false)?;
    confirm(format!("added permission to {}", range));
    Ok(())
}

fn network_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "permission network_remove <range> <group> <regex>";
    let range = arg(args, 0, usage)?;
    let group = arg(args, 1, usage)?;
    let regex = arg(args, 2, usage)?;
    let query = query_string([("group", group), ("range", range), ("regex", regex)]);
    let perms = ctx.get_list(&ctx.url(&format!("{}?{}", PERMISSIONS, query)))?;
    let perm = match perms.as_slice() {
        [] => return Err(CliError::warning("no matching permission found")),
        [p] => p,
        _ => {
            return Err(CliError::warning(format!(
                "{} permissions match {} {} {}, expected one",
                perms.len(),
                range,
                group,
                regex
            )))
        }
    };
    let url = ctx.url(&format!("{}{}", PERMISSIONS, plain(&perm["id"])));
    ctx.delete(&url, Fields::new(), false, false)?;
    confirm(format!("removed permission for {}", range));
    Ok(())
}
