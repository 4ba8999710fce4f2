use super::{arg, confirm, Command, CommandOption};
use crate::fields;
use crate::mreg::context::Context;
use crate::mreg::domain_name::{is_longform, to_longform};
use crate::mreg::error::{CliError, Result};
use crate::mreg::history::DELETE_REDOABLE;
use crate::mreg::hosts::{
    aliases_of_host, has_records, hinfo_id_to_strings, hinfo_list, host_info_by_name,
    host_info_by_name_or_ip, host_url, ip_addresses, resolve_input_name, str_field,
};
use crate::mreg::util::{flag_value, forced, plain, query_string, Fields};
use crate::mreg::validate::{
    choose_ip_from_subnet, is_valid_email, is_valid_ip, is_valid_ipv4, is_valid_ipv4_subnet,
    is_valid_ipv6, is_valid_loc, is_valid_subnet, is_valid_ttl,
};
use serde_json::Value;

macro_rules! opt {
    ($name:expr, $usage:expr, $help:expr, $handler:expr) => {
        CommandOption {
            name: $name,
            usage: $usage,
            help: $help,
            handler: $handler,
        }
    };
}

pub fn command() -> Command {
    Command {
        name: "host",
        description: "Create, delete or edit host.\n    host <option> <argument(s)>",
        options: vec![
            opt!("info", "info <name|ip>", "Print information about host. If <name> is an alias the cname hosts info is shown.", info),
            opt!("remove", "remove <name|ip> [y]", "Remove host. Hosts with aliases or several addresses require force (y).", remove),
            opt!("add", "add <name> <ip/net> <contact> [-hinfo <hinfo>] [-comment <comment>] [y]", "Add a new host with the given name, ip or subnet and contact.", add),
            opt!("set_contact", "set_contact <name> <contact>", "Set contact for host. If <name> is an alias the cname host is updated.", set_contact),
            opt!("set_comment", "set_comment <name> <comment>", "Set comment for host. If <name> is an alias the cname host is updated.", set_comment),
            opt!("rename", "rename <old-name> <new-name> [y]", "Rename host. If <old-name> is an alias then the alias is renamed.", rename),
            opt!("a_add", "a_add <name> <ip|subnet>", "Add an A record to host. If <name> is an alias the cname host is used.", a_add),
            opt!("a_remove", "a_remove <name> <ip>", "Remove A record from host. If <name> is an alias the cname host is used.", a_remove),
            opt!("a_change", "a_change <name> <old-ip> <new-ip-or-subnet>", "Change A record. If <name> is an alias the cname host is used.", a_change),
            opt!("a_show", "a_show <name>", "Show hosts ipaddresses. If <name> is an alias the cname host is used.", show_addresses),
            opt!("aaaa_add", "aaaa_add <name> <ipv6>", "Add an AAAA record to host. If <name> is an alias the cname host is used.", aaaa_add),
            opt!("aaaa_remove", "aaaa_remove <name> <ipv6>", "Remove AAAA record from host. If <name> is an alias the cname host is used.", aaaa_remove),
            opt!("aaaa_change", "aaaa_change <name> <old-ipv6> <new-ipv6>", "Change AAAA record. If <name> is an alias the cname host is used.", aaaa_change),
            opt!("aaaa_show", "aaaa_show <name>", "Show hosts ipaddresses. If <name> is an alias the cname host is used.", show_addresses),
            opt!("ttl_set", "ttl_set <name> <ttl>", "Set ttl for host. Valid values are 300 <= TTL <= 68400 or \"default\".", ttl_set),
            opt!("ttl_remove", "ttl_remove <name>", "Remove explicit TTL for host.", ttl_remove),
            opt!("ttl_show", "ttl_show <name>", "Show ttl for host.", ttl_show),
            opt!("cname_add", "cname_add <existing-name> <new-alias>", "Add a CNAME record to host.", cname_add),
            opt!("cname_remove", "cname_remove <name> <alias-to-delete>", "Remove CNAME record.", cname_remove),
            opt!("cname_show", "cname_show <name>", "Show CNAME records for host.", cname_show),
            opt!("loc_set", "loc_set <name> <loc>", "Set location of host. If <name> is an alias the cname host is updated.", loc_set),
            opt!("loc_remove", "loc_remove <name>", "Remove location from host.", loc_remove),
            opt!("loc_show", "loc_show <name>", "Show location of host.", loc_show),
            opt!("hinfo_set", "hinfo_set <name> <hinfo>", "Set hinfo for host. If <name> is an alias the cname host is updated.", hinfo_set),
            opt!("hinfo_remove", "hinfo_remove <name>", "Remove hinfo for host.", hinfo_remove),
            opt!("hinfo_show", "hinfo_show <name>", "Show hinfo for host.", hinfo_show),
            opt!("srv_add", "srv_add <service-name> <pri> <weight> <port> <target-name> [y]", "Add SRV record.", srv_add),
            opt!("srv_remove", "srv_remove <service-name> [y]", "Remove SRV record.", srv_remove),
            opt!("srv_show", "srv_show <service-name>", "Show SRV records.", srv_show),
        ],
    }
}

#[derive(Copy, Clone)]
enum Family {
    V4,
    V6,
}

impl Family {
    fn label(self) -> &'static str {
        match self {
            Family::V4 => "ipv4",
            Family::V6 => "ipv6",
        }
    }

    fn is_valid(self, ip: &str) -> bool {
        match self {
            Family::V4 => is_valid_ipv4(ip),
            Family::V6 => is_valid_ipv6(ip),
        }
    }
}

/// Field value of a host, with `null` replaced by `default`.
fn field_or(info: &Value, key: &str, default: Value) -> Value {
    match info.get(key) {
        None | Some(Value::Null) => default,
        Some(v) => v.clone(),
    }
}

fn hostid(info: &Value) -> Value {
    field_or(info, "hostid", Value::Null)
}

fn show(label: &str, value: impl AsRef<str>) {
    println!("{:<10}{}", format!("{}:", label), value.as_ref());
}

/// Picks the address to use: a literal ip, or a random one from a subnet.
fn ip_from_ip_or_subnet(ip_or_net: &str, target: &str) -> Result<String> {
    if is_valid_ip(ip_or_net) {
        return Ok(String::from(ip_or_net));
    }
    if is_valid_subnet(ip_or_net) {
        return choose_ip_from_subnet(ip_or_net)
            .map(|ip| ip.to_string())
            .ok_or_else(|| {
                CliError::warning(format!("cannot choose an address from {} (target host {})", ip_or_net, target))
            });
    }
    Err(CliError::warning(format!(
        "invalid ip nor subnet: \"{}\" (target host {})",
        ip_or_net, target
    )))
}

/// Snapshot of the fields needed to recreate a host on undo.
fn host_snapshot(info: &Value) -> Fields {
    let mut snap = Fields::new();
    for key in ["name", "contact", "comment", "ttl", "hinfo", "loc"] {
        snap.insert(String::from(key), field_or(info, key, Value::Null));
    }
    // recreating a host takes a single address
    if let Some(ip) = ip_addresses(info).into_iter().next() {
        snap.insert(String::from("ipaddress"), Value::String(ip));
    }
    snap
}

fn info(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name_or_ip = arg(args, 0, "host info <name|ip>")?;
    let info = host_info_by_name_or_ip(ctx, name_or_ip)?;
    let name = str_field(&info, "name");
    show("Name", name);
    show("Contact", str_field(&info, "contact"));
    let comment = str_field(&info, "comment");
    if !comment.is_empty() {
        show("Comment", comment);
    }
    for ip in ip_addresses(&info) {
        show("Ipaddress", ip);
    }
    show("TTL", ttl_text(&info));
    if let Some(id) = info.get("hinfo").and_then(Value::as_i64) {
        let presets = hinfo_list(ctx)?;
        if let Some((cpu, os)) = hinfo_id_to_strings(&presets, id) {
            show("Hinfo", format!("cpu={} os={}", cpu, os));
        }
    }
    let loc = str_field(&info, "loc");
    if !loc.is_empty() {
        show("Loc", loc);
    }
    for alias in aliases_of_host(ctx, name)? {
        show("Cname", format!("{} -> {}", alias, name));
    }
    if let Some(txts) = info.get("txt").and_then(Value::as_array) {
        for txt in txts {
            show("TXT", plain(&txt["txt"]));
        }
    }
    tracing::info!("printed host info for {}", name);
    Ok(())
}

fn remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name_or_ip = arg(args, 0, "host remove <name|ip> [y]")?;
    let force = forced(args);
    let info = host_info_by_name_or_ip(ctx, name_or_ip)?;
    let name = String::from(str_field(&info, "name"));

    if ip_addresses(&info).len() > 1 && !force {
        return Err(CliError::warning(format!("{} has multiple ipaddresses, must force", name)));
    }
    let aliases = aliases_of_host(ctx, &name)?;
    if !aliases.is_empty() && !force {
        return Err(CliError::warning(format!("{} has {} aliases, must force", name, aliases.len())));
    }
    for alias in aliases {
        // the alias host can not be recreated with its CNAME record
        let url = host_url(ctx, &alias);
        ctx.delete(&url, Fields::new(), false, DELETE_REDOABLE)?;
        confirm(format!("deleted alias host {} when removing {}", alias, name));
    }

    let url = host_url(ctx, &name);
    ctx.delete(&url, host_snapshot(&info), true, DELETE_REDOABLE)?;
    confirm(format!("removed {}", name));
    Ok(())
}

fn add(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host add <name> <ip/net> <contact> [-hinfo <hinfo>] [-comment <comment>] [y]";
    let name = arg(args, 0, usage)?;
    let ip_or_net = arg(args, 1, usage)?;
    let contact = arg(args, 2, usage)?;

    let hinfo = match flag_value(args, "-hinfo") {
        Some(h) => {
            let id: i64 = h
                .parse()
                .map_err(|_| CliError::warning(format!("invalid hinfo ({}) when trying to add {}", h, name)))?;
            let presets = hinfo_list(ctx)?;
            if hinfo_id_to_strings(&presets, id).is_none() {
                return Err(CliError::warning(format!("invalid hinfo ({}) when trying to add {}", h, name)));
            }
            Some(id)
        }
        None => None,
    };
    let comment = flag_value(args, "-comment").filter(|c| !c.is_empty());
    let ip = ip_from_ip_or_subnet(ip_or_net, name)?;
    if !is_valid_email(contact) {
        return Err(CliError::warning(format!(
            "invalid mail address ({}) when trying to add {}",
            contact, name
        )));
    }

    match resolve_input_name(ctx, name) {
        Ok(existing) => {
            if !forced(args) {
                return Err(CliError::warning(format!("host {} already exists, must force", existing)));
            }
            let url = host_url(ctx, &existing);
            ctx.delete(&url, Fields::new(), false, DELETE_REDOABLE)?;
            confirm(format!("deleted existing host {}", existing));
        }
        Err(CliError::HostNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let name = to_longform(name, &ctx.config.domain, false);
    let data = fields! {
        "name" => name,
        "ipaddress" => ip,
        "contact" => contact,
        "hinfo" => hinfo,
        "comment" => comment,
    };
    let url = ctx.url("/hosts/");
    ctx.post(&url, &name, data, true, true)?;
    confirm(format!("created host {}", name));
    Ok(())
}

fn set_contact(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host set_contact <name> <contact>";
    let name = arg(args, 0, usage)?;
    let contact = arg(args, 1, usage)?;
    if !is_valid_email(contact) {
        return Err(CliError::warning(format!(
            "invalid mail address {} (target host: {})",
            contact, name
        )));
    }
    let info = host_info_by_name(ctx, name, true)?;
    let host = str_field(&info, "name");
    let url = host_url(ctx, host);
    ctx.patch(
        &url,
        fields! { "contact" => contact },
        fields! { "contact" => field_or(&info, "contact", Value::from("")) },
        true,
        true,
    )?;
    confirm(format!("updated contact of {} to {}", host, contact));
    Ok(())
}

fn set_comment(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host set_comment <name> <comment>";
    let name = arg(args, 0, usage)?;
    arg(args, 1, usage)?;
    let comment = args[1..].join(" ");
    let info = host_info_by_name(ctx, name, true)?;
    let host = str_field(&info, "name");
    let url = host_url(ctx, host);
    ctx.patch(
        &url,
        fields! { "comment" => comment },
        fields! { "comment" => field_or(&info, "comment", Value::from("")) },
        true,
        true,
    )?;
    confirm(format!("updated comment of {} to \"{}\"", host, comment));
    Ok(())
}

fn rename(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host rename <old-name> <new-name> [y]";
    let old_name = arg(args, 0, usage)?;
    let new_name = arg(args, 1, usage)?;
    let old_name = resolve_input_name(ctx, old_name)?;

    match host_info_by_name(ctx, new_name, false) {
        Ok(existing) => {
            let existing = String::from(str_field(&existing, "name"));
            if !forced(args) {
                return Err(CliError::warning(format!("host {} already exists, must force", existing)));
            }
            for alias in aliases_of_host(ctx, &existing)? {
                let url = host_url(ctx, &alias);
                ctx.delete(&url, Fields::new(), false, DELETE_REDOABLE)?;
                confirm(format!(
                    "deleted alias host {} when removing {} before renaming {}",
                    alias, existing, old_name
                ));
            }
            let url = host_url(ctx, &existing);
            ctx.delete(&url, Fields::new(), false, DELETE_REDOABLE)?;
            confirm(format!("deleted existing host {}", existing));
        }
        Err(CliError::HostNotFound(_)) => {}
        Err(e) => return Err(e),
    }

    let new_name = to_longform(new_name, &ctx.config.domain, false);
    let url = host_url(ctx, &old_name);
    // the url of the host changes, so neither undo nor redo would hit it
    ctx.patch(
        &url,
        fields! { "name" => new_name },
        fields! { "name" => old_name },
        false,
        false,
    )?;
    confirm(format!("renamed {} to {}", old_name, new_name));

    let url = ctx.url(&format!("/cnames/?{}", query_string([("cname", old_name.as_str())])));
    for cname in ctx.get_list_recorded(&url)? {
        let url = ctx.url(&format!("/cnames/{}", plain(&cname["id"])));
        ctx.patch(
            &url,
            fields! { "cname" => new_name },
            fields! { "cname" => old_name },
            true,
            true,
        )?;
    }
    Ok(())
}

fn add_address(ctx: &mut Context, args: &[String], family: Family, usage: &str) -> Result<()> {
    let name = arg(args, 0, usage)?;
    let ip_or_subnet = arg(args, 1, usage)?;
    let info = host_info_by_name(ctx, name, true)?;
    let host = str_field(&info, "name");

    let ip = match family {
        Family::V4 if is_valid_ipv4_subnet(ip_or_subnet) => ip_from_ip_or_subnet(ip_or_subnet, host)?,
        _ if family.is_valid(ip_or_subnet) => String::from(ip_or_subnet),
        _ => {
            return Err(CliError::warning(format!(
                "not a valid {}: \"{}\" (target host {})",
                family.label(),
                ip_or_subnet,
                host
            )))
        }
    };

    let url = ctx.url("/ipaddresses/");
    let data = fields! { "hostid" => hostid(&info), "ipaddress" => ip };
    ctx.post(&url, &ip, data, true, true)?;
    confirm(format!("added ip {} to {}", ip, host));
    Ok(())
}

fn remove_address(ctx: &mut Context, args: &[String], family: Family, usage: &str) -> Result<()> {
    let name = arg(args, 0, usage)?;
    let ip = arg(args, 1, usage)?;
    if !family.is_valid(ip) {
        return Err(CliError::warning(format!("not a valid {}: \"{}\"", family.label(), ip)));
    }
    let info = host_info_by_name(ctx, name, true)?;
    let host = str_field(&info, "name");
    if !ip_addresses(&info).iter().any(|a| a == ip) {
        return Err(CliError::warning(format!("{} is not owned by {}", ip, host)));
    }
    let url = ctx.url(&format!("/ipaddresses/{}", ip));
    let old = fields! { "hostid" => hostid(&info), "ipaddress" => ip };
    ctx.delete(&url, old, true, DELETE_REDOABLE)?;
    confirm(format!("removed ip {} from {}", ip, host));
    Ok(())
}

fn change_address(ctx: &mut Context, args: &[String], family: Family, usage: &str) -> Result<()> {
    let name = arg(args, 0, usage)?;
    let old_ip = arg(args, 1, usage)?;
    let new = arg(args, 2, usage)?;
    if !family.is_valid(old_ip) {
        return Err(CliError::warning(format!(
            "invalid {} \"{}\" (target host {})",
            family.label(),
            old_ip,
            name
        )));
    }
    let new_is_subnet = matches!(family, Family::V4) && is_valid_ipv4_subnet(new);
    if !family.is_valid(new) && !new_is_subnet {
        return Err(CliError::warning(format!(
            "invalid {} nor subnet \"{}\" (target host {})",
            family.label(),
            new,
            name
        )));
    }

    let info = host_info_by_name(ctx, name, true)?;
    let host = str_field(&info, "name");
    if !ip_addresses(&info).iter().any(|a| a == old_ip) {
        return Err(CliError::warning(format!("\"{}\" is not owned by {}", old_ip, host)));
    }
    let new_ip = if new_is_subnet {
        ip_from_ip_or_subnet(new, host)?
    } else {
        String::from(new)
    };

    let url = ctx.url(&format!("/ipaddresses/{}", old_ip));
    // the address is the resource key, so the url changes
    ctx.patch(
        &url,
        fields! { "ipaddress" => new_ip },
        fields! { "ipaddress" => old_ip },
        false,
        false,
    )?;
    confirm(format!("changed ip {} to {} for {}", old_ip, new_ip, host));
    Ok(())
}

fn a_add(ctx: &mut Context, args: &[String]) -> Result<()> {
    add_address(ctx, args, Family::V4, "host a_add <name> <ip|subnet>")
}

fn a_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    remove_address(ctx, args, Family::V4, "host a_remove <name> <ip>")
}

fn a_change(ctx: &mut Context, args: &[String]) -> Result<()> {
    change_address(ctx, args, Family::V4, "host a_change <name> <old-ip> <new-ip-or-subnet>")
}

fn aaaa_add(ctx: &mut Context, args: &[String]) -> Result<()> {
    add_address(ctx, args, Family::V6, "host aaaa_add <name> <ipv6>")
}

fn aaaa_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    remove_address(ctx, args, Family::V6, "host aaaa_remove <name> <ipv6>")
}

fn aaaa_change(ctx: &mut Context, args: &[String]) -> Result<()> {
    change_address(ctx, args, Family::V6, "host aaaa_change <name> <old-ipv6> <new-ipv6>")
}

fn show_addresses(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host a_show <name>")?;
    let info = host_info_by_name(ctx, name, true)?;
    for ip in ip_addresses(&info) {
        show("Ipaddress", ip);
    }
    Ok(())
}

fn ttl_text(info: &Value) -> String {
    match info.get("ttl") {
        Some(Value::Number(n)) if n.as_i64() != Some(-1) => n.to_string(),
        _ => String::from("(Default)"),
    }
}

fn set_field(ctx: &mut Context, name: &str, key: &str, new: Value, default_old: Value) -> Result<String> {
    let info = host_info_by_name(ctx, name, true)?;
    let host = String::from(str_field(&info, "name"));
    let url = host_url(ctx, &host);
    let old = field_or(&info, key, default_old);
    let mut new_data = Fields::new();
    new_data.insert(String::from(key), new);
    let mut old_data = Fields::new();
    old_data.insert(String::from(key), old);
    ctx.patch(&url, new_data, old_data, true, true)?;
    Ok(host)
}

fn ttl_set(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host ttl_set <name> <ttl>";
    let name = arg(args, 0, usage)?;
    let ttl = arg(args, 1, usage)?;
    if !is_valid_ttl(ttl) {
        return Err(CliError::warning(format!("invalid TTL value: {} (target host {})", ttl, name)));
    }
    let value = match ttl {
        "default" => Value::from(-1),
        n => Value::from(n.parse::<u32>().unwrap_or_default()),
    };
    let host = set_field(ctx, name, "ttl", value, Value::from(-1))?;
    confirm(format!("updated TTL for {}", host));
    Ok(())
}

fn ttl_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host ttl_remove <name>")?;
    let host = set_field(ctx, name, "ttl", Value::from(-1), Value::from(-1))?;
    confirm(format!("removed TTL for {}", host));
    Ok(())
}

fn ttl_show(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host ttl_show <name>")?;
    let info = host_info_by_name(ctx, name, true)?;
    show("TTL", ttl_text(&info));
    Ok(())
}

fn cname_add(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host cname_add <existing-name> <new-alias>";
    let name = arg(args, 0, usage)?;
    let alias = arg(args, 1, usage)?;
    let host_info = host_info_by_name(ctx, name, true)?;
    let host = String::from(str_field(&host_info, "name"));

    let alias_info = match host_info_by_name(ctx, alias, false) {
        Ok(existing) => {
            if has_records(&existing) {
                return Err(CliError::warning(format!(
                    "host {} already exists and has record(s)",
                    str_field(&existing, "name")
                )));
            }
            existing
        }
        Err(CliError::HostNotFound(_)) => {
            let alias = to_longform(alias, &ctx.config.domain, false);
            let data = fields! {
                "name" => alias,
                "contact" => field_or(&host_info, "contact", Value::Null),
            };
            let url = ctx.url("/hosts/");
            ctx.post(&url, &alias, data, true, true)?;
            host_info_by_name(ctx, &alias, false)?
        }
        Err(e) => return Err(e),
    };

    let url = ctx.url("/cnames/");
    let data = fields! { "hostid" => hostid(&alias_info), "cname" => host };
    // the id of the new record is not known, so it can not be undone
    ctx.post(&url, "", data, false, false)?;
    confirm(format!("added cname alias {} for {}", str_field(&alias_info, "name"), host));
    Ok(())
}

fn cname_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host cname_remove <name> <alias-to-delete>";
    let name = arg(args, 0, usage)?;
    let alias = arg(args, 1, usage)?;
    let host = resolve_input_name(ctx, name)?;
    let alias_info = host_info_by_name(ctx, alias, false)?;
    let alias = String::from(str_field(&alias_info, "name"));

    let target = alias_info
        .get("cname")
        .and_then(|c| c.get(0))
        .map(|c| plain(&c["cname"]));
    match target {
        None => return Err(CliError::warning(format!("\"{}\" doesn't have any CNAME records.", alias))),
        Some(t) if t != host => {
            return Err(CliError::warning(format!("\"{}\" is not an alias for \"{}\"", alias, host)))
        }
        Some(_) => {}
    }

    let url = host_url(ctx, &alias);
    ctx.delete(&url, Fields::new(), false, DELETE_REDOABLE)?;
    confirm(format!("removed cname alias {} for {}", alias, host));
    Ok(())
}

fn cname_show(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host cname_show <name>")?;
    let info = host_info_by_name(ctx, name, true)?;
    let host = str_field(&info, "name");
    for alias in aliases_of_host(ctx, host)? {
        show("Cname", format!("{} -> {}", alias, host));
    }
    Ok(())
}

fn loc_set(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host loc_set <name> <loc>";
    let name = arg(args, 0, usage)?;
    arg(args, 1, usage)?;
    let loc = args[1..].join(" ");
    if !is_valid_loc(&loc) {
        return Err(CliError::warning(format!("invalid LOC \"{}\" (target host {})", loc, name)));
    }
    let host = set_field(ctx, name, "loc", Value::from(loc.as_str()), Value::from(""))?;
    confirm(format!("updated LOC to {} for {}", loc, host));
    Ok(())
}

fn loc_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host loc_remove <name>")?;
    let host = set_field(ctx, name, "loc", Value::from(""), Value::from(""))?;
    confirm(format!("removed LOC for {}", host));
    Ok(())
}

fn loc_show(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host loc_show <name>")?;
    let info = host_info_by_name(ctx, name, true)?;
    show("Loc", str_field(&info, "loc"));
    Ok(())
}

fn hinfo_set(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host hinfo_set <name> <hinfo>";
    let name = arg(args, 0, usage)?;
    let hinfo = arg(args, 1, usage)?;
    let id: i64 = hinfo
        .parse()
        .map_err(|_| CliError::warning(format!("invalid hinfo \"{}\"", hinfo)))?;
    let presets = hinfo_list(ctx)?;
    if hinfo_id_to_strings(&presets, id).is_none() {
        return Err(CliError::warning(format!("invalid hinfo \"{}\"", hinfo)));
    }
    let host = set_field(ctx, name, "hinfo", Value::from(id), Value::from(-1))?;
    confirm(format!("updated hinfo to {} for {}", id, host));
    Ok(())
}

fn hinfo_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host hinfo_remove <name>")?;
    let host = set_field(ctx, name, "hinfo", Value::from(-1), Value::from(-1))?;
    confirm(format!("removed hinfo for {}", host));
    Ok(())
}

fn hinfo_show(ctx: &mut Context, args: &[String]) -> Result<()> {
    let name = arg(args, 0, "host hinfo_show <name>")?;
    let info = host_info_by_name(ctx, name, true)?;
    let presets = hinfo_list(ctx)?;
    match info.get("hinfo").and_then(Value::as_i64).and_then(|id| hinfo_id_to_strings(&presets, id)) {
        Some((cpu, os)) => show("Hinfo", format!("cpu={} os={}", cpu, os)),
        None => show("Hinfo", "(none)"),
    }
    Ok(())
}

fn service_name(ctx: &Context, sname: &str) -> String {
    if is_longform(sname, &ctx.config.domain) {
        String::from(sname)
    } else {
        to_longform(sname, &ctx.config.domain, true)
    }
}

fn number_arg(value: &str, what: &str) -> Result<u32> {
    value
        .parse()
        .map_err(|_| CliError::warning(format!("invalid {}: \"{}\"", what, value)))
}

fn srv_add(ctx: &mut Context, args: &[String]) -> Result<()> {
    let usage = "host srv_add <service-name> <pri> <weight> <port> <target-name> [y]";
    let sname = arg(args, 0, usage)?;
    let priority = number_arg(arg(args, 1, usage)?, "priority")?;
    let weight = number_arg(arg(args, 2, usage)?, "weight")?;
    let port = number_arg(arg(args, 3, usage)?, "port")?;
    let name = arg(args, 4, usage)?;

    let target = match resolve_input_name(ctx, name) {
        Ok(t) => t,
        Err(CliError::HostNotFound(_)) if forced(args) => String::from(name),
        Err(CliError::HostNotFound(_)) => {
            return Err(CliError::warning(format!("{} doesn't exist, must force", name)))
        }
        Err(e) => return Err(e),
    };

    let sname = service_name(ctx, sname);
    let url = ctx.url(&format!("/srvs/?{}", query_string([("service", sname.as_str())])));
    let existing = !ctx.get_list_recorded(&url)?.is_empty();

    let data = fields! {
        "service" => sname,
        "priority" => priority,
        "weight" => weight,
        "port" => port,
        "target" => target,
    };
    let url = ctx.url("/srvs/");
    ctx.post(&url, "", data, false, true)?;
    if existing {
        confirm(format!("added SRV record {} with target {} to existing entry", sname, target));
    } else {
        confirm(format!("added SRV record {} with target {}", sname, target));
    }
    Ok(())
}

fn srv_remove(ctx: &mut Context, args: &[String]) -> Result<()> {
    let sname = arg(args, 0, "host srv_remove <service-name> [y]")?;
    let sname = service_name(ctx, sname);
    let url = ctx.url(&format!("/srvs/?{}", query_string([("service", sname.as_str())])));
    let srvs = ctx.get_list_recorded(&url)?;
    if srvs.is_empty() {
        return Err(CliError::warning(format!("no service named {}", sname)));
    }
    if srvs.len() > 1 && !forced(args) {
        return Err(CliError::warning(format!("multiple services named {}, must force", sname)));
    }
    for srv in srvs {
        let mut snapshot = match srv {
            Value::Object(map) => map,
            _ => return Err(CliError::warning(format!("unexpected SRV record for {}", sname))),
        };
        let id = snapshot.remove("srvid").map(|v| plain(&v)).unwrap_or_default();
        let url = ctx.url(&format!("/srvs/{}", id));
        let target = snapshot.get("target").map(plain).unwrap_or_default();
        ctx.delete(&url, snapshot, true, DELETE_REDOABLE)?;
        confirm(format!("removed SRV record {} with target {}", sname, target));
    }
    Ok(())
}

fn srv_show(ctx: &mut Context, args: &[String]) -> Result<()> {
    let sname = arg(args, 0, "host srv_show <service-name>")?;
    let url = ctx.url(&format!("/srvs/?{}", query_string([("service__contains", sname)])));
    let mut srvs = ctx.get_list_recorded(&url)?;
    if srvs.is_empty() {
        return Err(CliError::warning(format!("no service matching {}", sname)));
    }
    srvs.sort_by_key(|s| plain(&s["service"]));
    let width = srvs.iter().map(|s| plain(&s["service"]).len()).max().unwrap_or(0);
    let mut prev = String::new();
    for srv in &srvs {
        let service = plain(&srv["service"]);
        let shown = if service == prev { "" } else { service.as_str() };
        println!(
            "{:<w$} IN SRV {:>3} {:>3} {:>5} {}",
            shown,
            plain(&srv["priority"]),
            plain(&srv["weight"]),
            plain(&srv["port"]),
            plain(&srv["target"]),
            w = width
        );
        prev = service;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::fields;
    use crate::mreg::commands::Registry;
    use crate::mreg::context::testing::{context, url};
    use crate::mreg::context::Context;
    use crate::mreg::error::{CliError, HistoryError};
    use crate::mreg::history::Method;
    use crate::mreg::hosts::testing::{alias, host};
    use crate::mreg::http::testing::{Call, FakeTransport};
    use crate::mreg::util::split_words;
    use assert_matches::assert_matches;
    use serde_json::{json, Value};

    fn run(ctx: &mut Context, line: &str) -> crate::mreg::error::Result<()> {
        Registry::new().dispatch(ctx, &split_words(line))
    }

    fn with_host(t: &FakeTransport, name: &str, ips: &[&str]) {
        t.respond(&url(&format!("/hosts/{}", name)), host(name, ips));
        t.respond(&url(&format!("/cnames/?cname={}", name)), json!([]));
    }

    #[test]
    fn add_then_undo_and_redo() {
        let (mut ctx, t) = context();
        run(&mut ctx, "host add a 10.0.0.1 hostmaster@example.org -comment web").unwrap();
        let created = fields! {
            "name" => "a.example.org",
            "ipaddress" => "10.0.0.1",
            "contact" => "hostmaster@example.org",
            "hinfo" => Value::Null,
            "comment" => "web",
        };
        assert_eq!(t.calls(), vec![Call::Post(url("/hosts/"), created.clone())]);

        run(&mut ctx, "history undo 1").unwrap();
        run(&mut ctx, "history redo 1").unwrap();
        assert_eq!(
            t.calls(),
            vec![
                Call::Post(url("/hosts/"), created.clone()),
                Call::Delete(url("/hosts/a.example.org")),
                Call::Post(url("/hosts/"), created),
            ]
        );
    }

    #[test]
    fn add_validates_before_calling() {
        let (mut ctx, t) = context();
        assert_matches!(run(&mut ctx, "host add a 10.0.0.1 nobody"), Err(CliError::Warning(_)));
        assert_matches!(run(&mut ctx, "host add a 10.0.0.999 a@example.org"), Err(CliError::Warning(_)));
        assert_matches!(run(&mut ctx, "host add a 10.0.0.1"), Err(CliError::Usage(_)));
        assert!(t.calls().is_empty());
        assert!(ctx.history.is_empty());
    }

    #[test]
    fn add_existing_host_requires_force() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &["10.0.0.1"]);
        assert_matches!(
            run(&mut ctx, "host add a.example.org 10.0.0.2 a@example.org"),
            Err(CliError::Warning(m)) if m.contains("must force")
        );
        run(&mut ctx, "host add a.example.org 10.0.0.2 a@example.org y").unwrap();
        let entries = ctx.history.entries();
        assert_eq!(entries[0].method, Method::Delete);
        assert!(!entries[0].undoable);
        assert_eq!(entries[1].method, Method::Post);
        assert!(entries[1].undoable);
    }

    #[test]
    fn add_from_subnet_picks_an_address_inside() {
        let (mut ctx, t) = context();
        run(&mut ctx, "host add b 10.1.2.0/24 a@example.org").unwrap();
        match &t.calls()[0] {
            Call::Post(_, data) => {
                let ip = data["ipaddress"].as_str().unwrap();
                assert!(ip.starts_with("10.1.2."));
            }
            c => panic!("unexpected call {:?}", c),
        }
    }

    #[test]
    fn remove_records_restorable_snapshot() {
        let (mut ctx, t) = context();
        with_host(&t, "b.example.org", &["10.0.0.1"]);
        run(&mut ctx, "host remove b.example.org").unwrap();

        let entry = ctx.history.get(1).unwrap();
        assert_eq!(entry.method, Method::Delete);
        assert!(entry.undoable && !entry.redoable);
        assert_eq!(entry.old_data["ipaddress"], json!("10.0.0.1"));
        assert_eq!(entry.old_data["name"], json!("b.example.org"));

        run(&mut ctx, "history undo 1").unwrap();
        assert_matches!(
            run(&mut ctx, "history redo 1"),
            Err(CliError::History(HistoryError::NotRedoable(1)))
        );
        let calls = t.calls();
        assert_eq!(calls[0], Call::Delete(url("/hosts/b.example.org")));
        assert_matches!(&calls[1], Call::Post(u, d) if *u == url("/hosts/") && d["name"] == json!("b.example.org"));
    }

    #[test]
    fn remove_with_aliases_needs_force() {
        let (mut ctx, t) = context();
        with_host(&t, "b.example.org", &["10.0.0.1"]);
        t.respond(
            &url("/cnames/?cname=b.example.org"),
            json!([{ "id": 3, "name": "www.example.org", "cname": "b.example.org" }]),
        );
        assert_matches!(run(&mut ctx, "host remove b.example.org"), Err(CliError::Warning(_)));
        run(&mut ctx, "host remove b.example.org y").unwrap();
        assert_eq!(
            t.calls(),
            vec![
                Call::Delete(url("/hosts/www.example.org")),
                Call::Delete(url("/hosts/b.example.org")),
            ]
        );
        assert!(!ctx.history.get(1).unwrap().undoable);
        assert!(ctx.history.get(2).unwrap().undoable);
    }

    #[test]
    fn ttl_set_and_undo() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &[]);
        run(&mut ctx, "host ttl_set a.example.org 600").unwrap();
        let entry = ctx.history.get(1).unwrap();
        assert_eq!(entry.new_data, fields! { "ttl" => 600 });
        assert_eq!(entry.old_data, fields! { "ttl" => -1 });

        run(&mut ctx, "history undo 1").unwrap();
        assert_eq!(
            t.calls()[1],
            Call::Patch(url("/hosts/a.example.org"), fields! { "ttl" => -1 })
        );
        assert_matches!(run(&mut ctx, "host ttl_set a.example.org 5"), Err(CliError::Warning(_)));
    }

    #[test]
    fn field_patches_follow_aliases() {
        let (mut ctx, t) = context();
        t.respond(&url("/hosts/www.example.org"), alias("www.example.org", "a.example.org"));
        with_host(&t, "a.example.org", &[]);
        run(&mut ctx, "host set_contact www.example.org new@example.org").unwrap();
        run(&mut ctx, "host set_comment www.example.org two words").unwrap();
        run(&mut ctx, "host loc_set a.example.org 59 56 N 10 43 E 94m").unwrap();
        run(&mut ctx, "host loc_remove a.example.org").unwrap();
        assert_eq!(
            t.calls(),
            vec![
                Call::Patch(url("/hosts/a.example.org"), fields! { "contact" => "new@example.org" }),
                Call::Patch(url("/hosts/a.example.org"), fields! { "comment" => "two words" }),
                Call::Patch(url("/hosts/a.example.org"), fields! { "loc" => "59 56 N 10 43 E 94m" }),
                Call::Patch(url("/hosts/a.example.org"), fields! { "loc" => "" }),
            ]
        );
        assert_eq!(ctx.history.get(2).unwrap().old_data, fields! { "comment" => "" });
        assert!(ctx.history.entries().iter().all(|e| e.undoable && e.redoable));
    }

    #[test]
    fn rename_is_final_but_cname_retargets_are_not() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &[]);
        t.respond(
            &url("/cnames/?cname=a.example.org"),
            json!([{ "id": 4, "name": "www.example.org", "cname": "a.example.org" }]),
        );
        run(&mut ctx, "host rename a.example.org c").unwrap();

        assert_eq!(
            t.calls(),
            vec![
                Call::Patch(url("/hosts/a.example.org"), fields! { "name" => "c.example.org" }),
                Call::Patch(url("/cnames/4"), fields! { "cname" => "c.example.org" }),
            ]
        );
        let methods: Vec<Method> = ctx.history.entries().iter().map(|e| e.method).collect();
        assert_eq!(methods, vec![Method::Patch, Method::Get, Method::Patch]);
        assert_matches!(
            run(&mut ctx, "history undo 1"),
            Err(CliError::History(HistoryError::NotUndoable(1)))
        );
        run(&mut ctx, "history undo 3").unwrap();
    }

    #[test]
    fn address_records() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &["10.0.0.1", "2001:db8::1"]);
        t.respond(&url("/hosts/a.example.org"), {
            let mut h = host("a.example.org", &["10.0.0.1", "2001:db8::1"]);
            h["hostid"] = json!(12);
            h
        });
        run(&mut ctx, "host a_add a.example.org 10.0.0.2").unwrap();
        run(&mut ctx, "host aaaa_add a.example.org 2001:db8::2").unwrap();
        run(&mut ctx, "host a_remove a.example.org 10.0.0.1").unwrap();
        run(&mut ctx, "host aaaa_change a.example.org 2001:db8::1 2001:db8::3").unwrap();
        assert_matches!(run(&mut ctx, "host a_add a.example.org 2001:db8::9"), Err(CliError::Warning(_)));
        assert_matches!(run(&mut ctx, "host aaaa_add a.example.org 10.0.0.9"), Err(CliError::Warning(_)));
        assert_matches!(run(&mut ctx, "host a_remove a.example.org 10.0.0.7"), Err(CliError::Warning(_)));

        assert_eq!(
            t.calls(),
            vec![
                Call::Post(url("/ipaddresses/"), fields! { "hostid" => 12, "ipaddress" => "10.0.0.2" }),
                Call::Post(url("/ipaddresses/"), fields! { "hostid" => 12, "ipaddress" => "2001:db8::2" }),
                Call::Delete(url("/ipaddresses/10.0.0.1")),
                Call::Patch(url("/ipaddresses/2001:db8::1"), fields! { "ipaddress" => "2001:db8::3" }),
            ]
        );
        let e = ctx.history.get(4).unwrap();
        assert!(!e.undoable && !e.redoable);

        run(&mut ctx, "history undo 1").unwrap();
        run(&mut ctx, "history undo 3").unwrap();
        assert_eq!(t.calls()[4], Call::Delete(url("/ipaddresses/10.0.0.2")));
        assert_eq!(
            t.calls()[5],
            Call::Post(url("/ipaddresses/"), fields! { "hostid" => 12, "ipaddress" => "10.0.0.1" })
        );
    }

    #[test]
    fn cname_add_creates_alias_host() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &["10.0.0.1"]);
        // the alias host appears once it has been created
        run(&mut ctx, "host cname_add a www").unwrap_err();
        assert_eq!(t.calls().len(), 1);
        t.respond(&url("/hosts/www.example.org"), host("www.example.org", &[]));
        run(&mut ctx, "host cname_add a www").unwrap();

        let last = ctx.history.entries().last().unwrap();
        assert_eq!(last.method, Method::Post);
        assert!(!last.undoable && !last.redoable);
        assert_eq!(
            t.calls().last().unwrap(),
            &Call::Post(url("/cnames/"), fields! { "hostid" => 7, "cname" => "a.example.org" })
        );
    }

    #[test]
    fn cname_remove_checks_target() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &[]);
        with_host(&t, "b.example.org", &[]);
        t.respond(&url("/hosts/www.example.org"), alias("www.example.org", "a.example.org"));
        assert_matches!(
            run(&mut ctx, "host cname_remove b.example.org www.example.org"),
            Err(CliError::Warning(m)) if m.contains("is not an alias")
        );
        run(&mut ctx, "host cname_remove a.example.org www.example.org").unwrap();
        assert_eq!(t.calls(), vec![Call::Delete(url("/hosts/www.example.org"))]);
        assert!(!ctx.history.get(1).unwrap().undoable);
    }

    #[test]
    fn hinfo_presets_are_checked() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &[]);
        t.respond(&url("/hinfopresets/"), json!([{ "hinfoid": 1, "cpu": "x86", "os": "Linux" }]));
        assert_matches!(run(&mut ctx, "host hinfo_set a.example.org 2"), Err(CliError::Warning(_)));
        run(&mut ctx, "host hinfo_set a.example.org 1").unwrap();
        run(&mut ctx, "host hinfo_remove a.example.org").unwrap();
        assert_eq!(
            t.calls(),
            vec![
                Call::Patch(url("/hosts/a.example.org"), fields! { "hinfo" => 1 }),
                Call::Patch(url("/hosts/a.example.org"), fields! { "hinfo" => -1 }),
            ]
        );
    }

    #[test]
    fn srv_add_and_remove() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &[]);
        let service_url = url("/srvs/?service=_sip._tcp.example.org.");
        t.respond(&service_url, json!([]));
        assert_matches!(run(&mut ctx, "host srv_add _sip._tcp 10 5 5060 nope"), Err(CliError::Warning(_)));
        run(&mut ctx, "host srv_add _sip._tcp 10 5 5060 a").unwrap();

        let post = ctx.history.get(2).unwrap();
        assert_eq!(ctx.history.get(1).unwrap().method, Method::Get);
        assert!(!post.undoable && post.redoable);
        assert_eq!(post.new_data["port"], json!(5060));
        assert_eq!(post.new_data["target"], json!("a.example.org"));

        t.respond(
            &service_url,
            json!([{ "srvid": 9, "service": "_sip._tcp.example.org.", "priority": 10, "weight": 5, "port": 5060, "target": "a.example.org" }]),
        );
        run(&mut ctx, "host srv_remove _sip._tcp").unwrap();
        let del = ctx.history.get(4).unwrap();
        assert_eq!(del.url, url("/srvs/9"));
        assert!(del.undoable && !del.redoable);
        assert!(!del.old_data.contains_key("srvid"));
        run(&mut ctx, "history undo 4").unwrap();
        assert_matches!(t.calls().last().unwrap(), Call::Post(u, _) if *u == url("/srvs/"));
    }

    #[test]
    fn srv_remove_multiple_needs_force() {
        let (mut ctx, t) = context();
        t.respond(
            &url("/srvs/?service=_x._tcp.example.org."),
            json!([
                { "srvid": 1, "service": "_x._tcp.example.org.", "target": "a.example.org" },
                { "srvid": 2, "service": "_x._tcp.example.org.", "target": "b.example.org" },
            ]),
        );
        assert_matches!(run(&mut ctx, "host srv_remove _x._tcp"), Err(CliError::Warning(_)));
        run(&mut ctx, "host srv_remove _x._tcp y").unwrap();
        assert_eq!(
            t.calls(),
            vec![Call::Delete(url("/srvs/1")), Call::Delete(url("/srvs/2"))]
        );
    }

    #[test]
    fn read_only_options() {
        let (mut ctx, t) = context();
        with_host(&t, "a.example.org", &["10.0.0.1"]);
        t.respond(&url("/srvs/?service__contains=_sip"), json!([
            { "service": "_sip._tcp.example.org.", "priority": 1, "weight": 1, "port": 5060, "target": "a.example.org" },
        ]));
        for line in [
            "host info a.example.org",
            "host a_show a.example.org",
            "host aaaa_show a.example.org",
            "host ttl_show a.example.org",
            "host cname_show a.example.org",
            "host loc_show a.example.org",
            "host srv_show _sip",
        ] {
            run(&mut ctx, line).unwrap();
        }
        assert!(t.calls().is_empty());
        // only the SRV lookup is audited
        assert_eq!(ctx.history.len(), 1);
    }
}
