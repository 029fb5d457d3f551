// User and group identity records (getent passwd / group)

use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub name: String,
    pub uid: u32,
    pub gid: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRecord {
    pub name: String,
    pub gid: u32,
}

/// Users keyed by uid. One entry per uid; the last record parsed wins.
pub type UserMap = HashMap<u32, UserRecord>;

/// Groups keyed by gid. One entry per gid; the last record parsed wins.
pub type GroupMap = HashMap<u32, GroupRecord>;
