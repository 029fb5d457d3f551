// Parsing of identity (passwd / group) and job-queue text into lookup tables.
// Every parser is fail-fast: one bad line rejects the whole batch.

use crate::error::ScrapeError;
use crate::models::{GroupMap, GroupRecord, JobRecord, UserMap, UserRecord};

pub const ORIGIN_USERS: &str = "user identities";
pub const ORIGIN_GROUPS: &str = "group identities";
pub const ORIGIN_JOBS: &str = "job queue";

fn non_empty_lines<'a>(
    text: &'a str,
    origin: &'static str,
) -> Result<std::str::Lines<'a>, ScrapeError> {
    let content = text.trim();
    if content.is_empty() {
        return Err(ScrapeError::EmptySource { origin });
    }
    Ok(content.lines())
}

fn parse_id(field: &str, origin: &'static str, line: &str, what: &str) -> Result<u32, ScrapeError> {
    field
        .parse::<u32>()
        .map_err(|e| ScrapeError::malformed(origin, line, format!("{} {:?}: {}", what, field, e)))
}

/// Parse `name:passwd:uid:gid:...` lines.
pub fn parse_users(text: &str) -> Result<UserMap, ScrapeError> {
    let mut users = UserMap::new();
    for line in non_empty_lines(text, ORIGIN_USERS)? {
        let fields: Vec<&str> = line.splitn(5, ':').collect();
        if fields.len() < 4 {
            return Err(ScrapeError::malformed(
                ORIGIN_USERS,
                line,
                "insufficient field count",
            ));
        }
        let uid = parse_id(fields[2], ORIGIN_USERS, line, "uid")?;
        let gid = parse_id(fields[3], ORIGIN_USERS, line, "gid")?;
        users.insert(
            uid,
            UserRecord {
                name: fields[0].to_string(),
                uid,
                gid,
            },
        );
    }
    Ok(users)
}

/// Parse `name:passwd:gid:members` lines.
pub fn parse_groups(text: &str) -> Result<GroupMap, ScrapeError> {
    let mut groups = GroupMap::new();
    for line in non_empty_lines(text, ORIGIN_GROUPS)? {
        let fields: Vec<&str> = line.splitn(4, ':').collect();
        if fields.len() < 3 {
            return Err(ScrapeError::malformed(
                ORIGIN_GROUPS,
                line,
                "insufficient field count",
            ));
        }
        let gid = parse_id(fields[2], ORIGIN_GROUPS, line, "gid")?;
        groups.insert(
            gid,
            GroupRecord {
                name: fields[0].to_string(),
                gid,
            },
        );
    }
    Ok(groups)
}

/// Parse `jobid account user` lines.
pub fn parse_jobs(text: &str) -> Result<Vec<JobRecord>, ScrapeError> {
    non_empty_lines(text, ORIGIN_JOBS)?
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            match fields.as_slice() {
                [job_id, account, user] => Ok(JobRecord::new(*job_id, *account, *user)),
                _ => Err(ScrapeError::malformed(
                    ORIGIN_JOBS,
                    line,
                    format!("expected 3 fields, got {}", fields.len()),
                )),
            }
        })
        .collect()
}
