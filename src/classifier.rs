// Series key classification: scheduled job id or `<proc_name>.<uid>`.

use crate::error::ScrapeError;
use crate::models::ClassifiedSample;

fn is_integer(s: &str) -> bool {
    s.parse::<i64>().is_ok()
}

/// Classify a raw series key.
///
/// A key that parses as a base-10 integer is a job id. Otherwise the last
/// dot-separated field is the uid and everything before it is the process
/// name, so process names may themselves contain dots.
pub fn classify(key: &str) -> Result<ClassifiedSample, ScrapeError> {
    if is_integer(key) {
        return Ok(ClassifiedSample::Job {
            job_id: key.to_string(),
        });
    }

    let Some((proc_name, uid)) = key.rsplit_once('.') else {
        return Err(ScrapeError::UnparseableKey {
            key: key.to_string(),
        });
    };

    let uid = uid.parse::<i64>().map_err(|_| ScrapeError::InvalidUid {
        key: key.to_string(),
    })?;

    Ok(ClassifiedSample::Process {
        proc_name: proc_name.to_string(),
        uid,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn process(name: &str, uid: i64) -> ClassifiedSample {
        ClassifiedSample::Process {
            proc_name: name.into(),
            uid,
        }
    }

    #[test]
    fn classify_job_id() {
        assert_eq!(
            classify("35044931").unwrap(),
            ClassifiedSample::Job {
                job_id: "35044931".into()
            }
        );
    }

    #[test]
    fn classify_process_with_uid() {
        assert_eq!(classify("touch.6812").unwrap(), process("touch", 6812));
    }

    #[test]
    fn classify_process_name_with_dots() {
        assert_eq!(classify("xrootd.foo.6812").unwrap(), process("xrootd.foo", 6812));
    }

    #[test]
    fn classify_root_uid() {
        assert_eq!(classify("ll_sa_11831.0").unwrap(), process("ll_sa_11831", 0));
    }

    #[test]
    fn classify_single_field_is_unparseable() {
        assert!(matches!(
            classify("touch"),
            Err(ScrapeError::UnparseableKey { .. })
        ));
    }

    #[test]
    fn classify_out_of_range_uid_is_still_a_process() {
        assert_eq!(classify("cp.-1").unwrap(), process("cp", -1));
        assert_eq!(
            classify("cp.4294967296").unwrap(),
            process("cp", 4_294_967_296)
        );
    }

    #[test]
    fn classify_non_numeric_uid() {
        assert!(matches!(
            classify("rsync.daemon"),
            Err(ScrapeError::InvalidUid { .. })
        ));
        assert!(matches!(
            classify("rsync."),
            Err(ScrapeError::InvalidUid { .. })
        ));
    }
}
