use clap::{Args, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{debug, info};

use rustmq_console::acl::{
    format_principal, parse_principal, AclCategory, ClusterAcl, PermissionType, PrincipalGroup,
    PrincipalType, ResourceAcl, ANY_HOST,
};
use rustmq_console::admin::AclEditor;
use rustmq_console::{ConsoleError, Result};

use super::formatters::{confirm_operation, Output};

#[derive(Subcommand)]
pub enum AclCommands {
    /// List principal groups, or every flat ACL with --flat
    List(AclListCommand),
    /// Show every ACL of one principal
    Show(AclShowCommand),
    /// Print an empty principal group to edit and apply
    Template(AclTemplateCommand),
    /// Replace a principal's ACLs with the contents of a group file
    Apply(AclApplyCommand),
    /// Delete every ACL of a principal
    Delete(AclDeleteCommand),
}

#[derive(Args)]
pub struct AclListCommand {
    /// Print flat ACL entries instead of principal groups
    #[arg(long)]
    pub flat: bool,
}

#[derive(Args)]
pub struct AclShowCommand {
    /// Principal, e.g. `alice` or `RedpandaRole:ops`
    pub principal: String,
    #[arg(long, default_value = ANY_HOST)]
    pub host: String,
}

#[derive(Args)]
pub struct AclTemplateCommand {
    pub principal: String,
    #[arg(long, default_value = ANY_HOST)]
    pub host: String,
}

#[derive(Args)]
pub struct AclApplyCommand {
    /// JSON file holding the edited principal group
    #[arg(long)]
    pub file: PathBuf,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct AclDeleteCommand {
    pub principal: String,
    #[arg(long, default_value = ANY_HOST)]
    pub host: String,
    #[arg(long)]
    pub yes: bool,
}

/// One line of `acl list`
#[derive(Debug, Serialize)]
pub struct PrincipalGroupRow {
    pub principal: String,
    pub host: String,
    pub topics: usize,
    pub consumer_groups: usize,
    pub transactional_ids: usize,
    pub cluster: String,
    pub acls: usize,
}

impl From<&PrincipalGroup> for PrincipalGroupRow {
    fn from(group: &PrincipalGroup) -> Self {
        Self {
            principal: group.principal(),
            host: group.host.clone(),
            topics: group.topic_acls.len(),
            consumer_groups: group.consumer_group_acls.len(),
            transactional_ids: group.transactional_id_acls.len(),
            cluster: describe_cluster(&group.cluster_acls),
            acls: group.source_entries.len(),
        }
    }
}

/// One selector of `acl show`
#[derive(Debug, Serialize)]
pub struct SelectorRow {
    pub category: String,
    pub pattern: String,
    pub selector: String,
    pub all: String,
    pub permissions: String,
}

/// Flatten a group into one row per selector plus one for the cluster
pub fn selector_rows(group: &PrincipalGroup) -> Vec<SelectorRow> {
    let mut rows: Vec<SelectorRow> = AclCategory::SELECTOR_BASED
        .iter()
        .flat_map(|category| {
            group
                .selector_acls(*category)
                .iter()
                .map(move |acl| selector_row(*category, acl))
        })
        .collect();

    rows.push(SelectorRow {
        category: format!("{:?}", AclCategory::Cluster),
        pattern: "-".to_string(),
        selector: "-".to_string(),
        all: group.cluster_acls.all.to_string(),
        permissions: describe_permissions(group.cluster_acls.permissions.iter()),
    });
    rows
}

fn selector_row(category: AclCategory, acl: &ResourceAcl) -> SelectorRow {
    SelectorRow {
        category: format!("{:?}", category),
        pattern: acl.pattern_type.to_string(),
        selector: acl.selector.clone(),
        all: acl.all.to_string(),
        permissions: describe_permissions(acl.permissions.iter()),
    }
}

fn describe_permissions<'a, I, O>(permissions: I) -> String
where
    I: Iterator<Item = (&'a O, &'a PermissionType)>,
    O: std::fmt::Display + 'a,
{
    let decided: Vec<String> = permissions
        .filter(|(_, p)| p.is_decided())
        .map(|(op, p)| format!("{}={}", op, p))
        .collect();
    if decided.is_empty() {
        "-".to_string()
    } else {
        decided.join(" ")
    }
}

fn describe_cluster(cluster: &ClusterAcl) -> String {
    if cluster.all.is_decided() {
        return format!("All={}", cluster.all);
    }
    let decided = cluster.permissions.values().filter(|p| p.is_decided()).count();
    if decided == 0 {
        "-".to_string()
    } else {
        format!("{} ops", decided)
    }
}

/// Accept `alice` as shorthand for `User:alice`
pub fn normalize_principal(principal: &str) -> (PrincipalType, String, String) {
    let (principal_type, name) = parse_principal(principal);
    let wire = format_principal(&principal_type, &name);
    (principal_type, name, wire)
}

pub async fn execute_acl_command(cmd: &AclCommands, editor: &mut AclEditor, out: &Output) -> Result<()> {
    match cmd {
        AclCommands::List(args) => {
            debug!("Listing ACLs");
            let snapshot = editor.load().await?;
            for warning in &snapshot.warnings {
                out.warning(warning);
            }
            if !snapshot.authorizer_enabled {
                out.warning("The cluster authorizer is disabled; ACLs are not enforced");
            }

            if args.flat {
                out.print(&snapshot.acls)?;
            } else {
                let rows: Vec<PrincipalGroupRow> =
                    snapshot.groups.iter().map(PrincipalGroupRow::from).collect();
                out.print(&rows)?;
            }
        }
        AclCommands::Show(args) => {
            let (_, _, principal) = normalize_principal(&args.principal);
            debug!("Showing ACLs of {} on host {}", principal, args.host);

            let snapshot = editor.load().await?;
            let group = snapshot
                .find_group(&principal, &args.host)
                .ok_or_else(|| {
                    ConsoleError::NotFound(format!("No ACLs for {} on host {}", principal, args.host))
                })?;

            match out.format {
                super::formatters::OutputFormat::Table => out.print(&selector_rows(group))?,
                _ => out.print(group)?,
            }
        }
        AclCommands::Template(args) => {
            let (principal_type, name, _) = normalize_principal(&args.principal);
            let group = PrincipalGroup::empty(principal_type, name, args.host.clone());
            println!("{}", serde_json::to_string_pretty(&group)?);
        }
        AclCommands::Apply(args) => {
            let content = std::fs::read_to_string(&args.file)?;
            let edited: PrincipalGroup = serde_json::from_str(&content)?;
            let principal = edited.principal();
            info!("Applying ACLs for {} from {}", principal, args.file.display());

            let snapshot = editor.load().await?;
            let original = snapshot.find_group(&principal, &edited.host).cloned();

            if original.is_some()
                && !args.yes
                && !confirm_operation("replace every ACL of", &principal)
            {
                out.info("Operation cancelled");
                return Ok(());
            }

            let report = editor.save_group(original.as_ref(), &edited).await?;
            out.print(&report)?;
            if report.is_success() {
                out.success(&format!(
                    "Applied {} ACLs for {} (removed {})",
                    report.created, report.principal, report.deleted
                ));
            } else {
                out.error(&format!(
                    "{} ACLs could not be created for {}",
                    report.failed, report.principal
                ));
                std::process::exit(1);
            }
        }
        AclCommands::Delete(args) => {
            let (principal_type, name, principal) = normalize_principal(&args.principal);
            if !args.yes && !confirm_operation("delete every ACL of", &principal) {
                out.info("Operation cancelled");
                return Ok(());
            }

            let group = PrincipalGroup::empty(principal_type, name, args.host.clone());
            let deleted = editor.delete_group(&group).await?;
            if deleted == 0 {
                out.info(&format!("{} had no ACLs on host {}", principal, args.host));
            } else {
                out.success(&format!("Deleted {} ACLs of {}", deleted, principal));
            }
        }
    }

    Ok(())
}
