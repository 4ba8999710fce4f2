//! Host lookups shared by the command handlers.

use crate::mreg::context::Context;
use crate::mreg::domain_name::{is_longform, to_longform};
use crate::mreg::error::{CliError, Result};
use crate::mreg::util::query_string;
use crate::mreg::validate::is_valid_ip;
use serde::Deserialize;
use serde_json::Value;

#[derive(Debug, Clone, Deserialize)]
pub struct HinfoPreset {
    pub hinfoid: i64,
    pub cpu: String,
    pub os: String,
}

pub fn host_url(ctx: &Context, name: &str) -> String {
    ctx.url(&format!("/hosts/{}", name))
}

/// Fetches `name` as typed, then in long form. `None` if neither exists.
fn lookup(ctx: &Context, name: &str) -> Result<Option<Value>> {
    let mut candidates = vec![String::from(name)];
    if !is_longform(name, &ctx.config.domain) {
        candidates.push(to_longform(name, &ctx.config.domain, false));
    }
    for c in candidates {
        match ctx.get(&host_url(ctx, &c)) {
            Ok(info) => return Ok(Some(info)),
            Err(e) if e.is_not_found() => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(None)
}

fn name_of(info: &Value) -> Option<&str> {
    info.get("name").and_then(Value::as_str)
}

/// Returns the registered name of a host given in short or long form.
pub fn resolve_input_name(ctx: &Context, name: &str) -> Result<String> {
    match lookup(ctx, name)? {
        Some(info) => Ok(name_of(&info).map(String::from).unwrap_or_else(|| String::from(name))),
        None => Err(CliError::HostNotFound(String::from(name))),
    }
}

/// Fetches a host. With `follow_cnames`, an alias resolves to its target.
pub fn host_info_by_name(ctx: &Context, name: &str, follow_cnames: bool) -> Result<Value> {
    let info = lookup(ctx, name)?.ok_or_else(|| CliError::HostNotFound(String::from(name)))?;
    if follow_cnames {
        let target = info
            .get("cname")
            .and_then(|c| c.get(0))
            .and_then(|c| c.get("cname"))
            .and_then(Value::as_str);
        if let Some(target) = target {
            tracing::debug!(alias = name, target, "following cname");
            return host_info_by_name(ctx, target, false);
        }
    }
    Ok(info)
}

pub fn host_info_by_name_or_ip(ctx: &Context, name_or_ip: &str) -> Result<Value> {
    if !is_valid_ip(name_or_ip) {
        return host_info_by_name(ctx, name_or_ip, true);
    }
    let url = ctx.url(&format!(
        "/hosts/?{}",
        query_string([("ipaddress__ipaddress", name_or_ip)])
    ));
    ctx.get_list(&url)?
        .into_iter()
        .next()
        .ok_or_else(|| CliError::HostNotFound(String::from(name_or_ip)))
}

/// Names of the alias hosts pointing at `name`.
pub fn aliases_of_host(ctx: &Context, name: &str) -> Result<Vec<String>> {
    let url = ctx.url(&format!("/cnames/?{}", query_string([("cname", name)])));
    let aliases = ctx
        .get_list(&url)?
        .iter()
        .filter_map(|c| name_of(c).map(String::from))
        .collect();
    Ok(aliases)
}

pub fn hinfo_list(ctx: &Context) -> Result<Vec<HinfoPreset>> {
    let mut presets = Vec::new();
    for v in ctx.get_list(&ctx.url("/hinfopresets/"))? {
        let preset: HinfoPreset = serde_json::from_value(v).map_err(|e| {
            CliError::warning(format!("invalid hinfo preset from server: {}", e))
        })?;
        presets.push(preset);
    }
    presets.sort_by_key(|p| p.hinfoid);
    Ok(presets)
}

pub fn hinfo_id_to_strings(presets: &[HinfoPreset], id: i64) -> Option<(&str, &str)> {
    presets
        .iter()
        .find(|p| p.hinfoid == id)
        .map(|p| (p.cpu.as_str(), p.os.as_str()))
}

/// Addresses of a host as plain strings.
pub fn ip_addresses(info: &Value) -> Vec<String> {
    info.get("ipaddress")
        .and_then(Value::as_array)
        .map(|ips| {
            ips.iter()
                .filter_map(|r| r.get("ipaddress").and_then(Value::as_str))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

pub fn has_records(info: &Value) -> bool {
    let non_empty = |key: &str| match info.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    };
    ["hinfo", "loc", "cname", "ipaddress", "txt"].iter().any(|k| non_empty(k))
}

pub fn str_field<'a>(info: &'a Value, key: &str) -> &'a str {
    info.get(key).and_then(Value::as_str).unwrap_or_default()
}
