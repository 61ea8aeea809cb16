//! Built-in knowledge corpora.
//!
//! A starter set of documented workflow failure patterns, usable when no
//! corpus files are supplied. The rule corpus holds deterministic regex
//! rules; the semantic corpus holds richer pattern documents destined for
//! embedding. Corpus files loaded from disk share the same entry shape and
//! replace these wholesale.

use crate::entry::{Corpus, KnowledgeEntry, Severity};

#[allow(clippy::too_many_arguments)]
fn entry(
    id: &str,
    category: &str,
    severity: Severity,
    pattern: &str,
    title: &str,
    description: &str,
    causes: &[&str],
    solutions: &[&str],
    prevention: &[&str],
    fix_time: &str,
) -> KnowledgeEntry {
    KnowledgeEntry {
        id: id.to_string(),
        title: title.to_string(),
        category: category.to_string(),
        severity,
        pattern: pattern.to_string(),
        description: description.to_string(),
        causes: causes.iter().map(|s| s.to_string()).collect(),
        solutions: solutions.iter().map(|s| s.to_string()).collect(),
        prevention: prevention.iter().map(|s| s.to_string()).collect(),
        estimated_fix_time: Some(fix_time.to_string()),
        documentation: vec![],
    }
}

/// Deterministic rule corpus: small, ordered, regex-matched.
pub fn rule_corpus() -> Corpus {
    Corpus::from_entries(vec![
        entry(
            "rule_path_not_found",
            "storage",
            Severity::High,
            r"pathnotfound|blobnotfound|filenotfound|resourcenotfound|404|cannot find the specified (blob|path|file)|specified (blob|path) does not exist",
            "Source Path or Blob Not Found",
            "The source file, blob, or path referenced by the task does not exist at the expected location.",
            &[
                "Upstream system has not delivered the file yet",
                "Dynamic path expression resolved to a non-existent location",
                "File was moved, renamed, or deleted",
                "Container or file system name is wrong or case-mismatched",
            ],
            &[
                "Verify the blob or file exists at the resolved path in the storage account",
                "Inspect the resolved value of any dynamic path expression for the failing run",
                "Add an existence check task before the copy step",
                "Confirm the upstream delivery completed successfully",
            ],
            &[
                "Gate file operations behind a validation task with a timeout",
                "Trigger runs from file-arrival events instead of fixed schedules",
            ],
            "10-30 minutes",
        ),
        entry(
            "rule_connection_timeout",
            "connectivity",
            Severity::High,
            r"timed out|timeout expired|connection timeout|operation has timed out",
            "Connection Timeout",
            "A connection to a data source timed out before completing, indicating an overloaded, unreachable, or slow target.",
            &[
                "Target server overloaded or unresponsive",
                "Network latency or a security appliance slowing the path",
                "Connection pool exhaustion on the data source",
            ],
            &[
                "Increase the timeout on the connection configuration",
                "Check target server health and performance metrics",
                "Verify the network path between the runtime and the source",
            ],
            &[
                "Set timeouts from observed run history rather than defaults",
                "Schedule heavy workloads during off-peak hours",
            ],
            "15-30 minutes",
        ),
        entry(
            "rule_connection_refused",
            "connectivity",
            Severity::High,
            r"connection (refused|reset|closed)|unreachable|no route to host|tcp/ip connection .* failed",
            "Connection Refused or Host Unreachable",
            "The task could not establish a network connection to the target host.",
            &[
                "Target service is not running or not listening on the expected port",
                "Firewall or network security rules blocking traffic",
                "DNS resolution failure for the target hostname",
            ],
            &[
                "Verify the target service is running and listening",
                "Check firewall rules for the service port",
                "Test name resolution and reachability from the runtime host",
            ],
            &["Set up connection monitoring alerts", "Prefer private endpoints with documented rules"],
            "15-45 minutes",
        ),
        entry(
            "rule_auth_failed",
            "authentication",
            Severity::Critical,
            r"login failed|authentication failed|invalid credentials|access denied|password .* (expired|incorrect)|401",
            "Authentication Failure",
            "The credentials configured for the connection are incorrect, expired, or the account is locked.",
            &[
                "Password or secret rotated without updating the connection",
                "Service credential has expired",
                "Account locked after repeated failures",
            ],
            &[
                "Verify the credentials stored for the connection",
                "Renew the expired secret and update the connection configuration",
                "Check the identity provider sign-in logs for the rejected attempt",
            ],
            &[
                "Keep credentials in a managed vault with rotation alerts",
                "Prefer managed identities over stored passwords",
            ],
            "10-30 minutes",
        ),
        entry(
            "rule_permission_denied",
            "permission",
            Severity::High,
            r"forbidden|403|insufficient privileges|does not have permission|authorizationfailed|permission denied",
            "Insufficient Permissions",
            "The authenticated identity lacks the role or ACL permissions required for the operation.",
            &[
                "Missing role assignment on the target resource",
                "ACLs not set on the specific path",
                "Resource firewall rejecting the caller",
            ],
            &[
                "Assign the required role to the runtime identity on the target resource",
                "Check path-level ACLs for the failing operation",
                "Verify resource firewall rules admit the runtime",
            ],
            &["Audit role assignments regularly", "Document required permissions per connection"],
            "10-30 minutes",
        ),
        entry(
            "rule_rate_limited",
            "quota",
            Severity::High,
            r"429|too ?many ?requests|rate limit|throttl|quota exceeded",
            "Rate Limit or Quota Exceeded",
            "The operation exceeded a service quota or API rate limit.",
            &[
                "Too many concurrent runs or tasks",
                "Burst traffic against a throttled API",
                "Subscription-level quota reached",
            ],
            &[
                "Reduce concurrent task execution",
                "Add exponential backoff retries to the failing task",
                "Request a quota increase from the service provider",
            ],
            &["Stagger schedules to avoid burst traffic", "Monitor quota usage with alerts"],
            "15-60 minutes",
        ),
    ])
    .expect("builtin rule corpus is valid")
}

/// Semantic corpus: larger pattern documents searched by similarity.
pub fn semantic_corpus() -> Corpus {
    Corpus::from_entries(vec![
        entry(
            "sem_schema_mismatch",
            "schema",
            Severity::High,
            "schema mismatch column not found mapping invalid type mismatch data type cannot be converted",
            "Schema or Column Mismatch",
            "The source data schema does not match the schema expected by the task mapping, breaking the copy or transform step.",
            &[
                "Source added, renamed, or removed columns",
                "Mapping references a column that no longer exists",
                "Incompatible data types between source and sink",
            ],
            &[
                "Compare the live source schema with the task mapping",
                "Refresh the dataset schema and update the mapping",
                "Add explicit type conversions for incompatible columns",
            ],
            &[
                "Enable schema drift tolerance where supported",
                "Validate schemas as a pre-check task",
            ],
            "15-60 minutes",
        ),
        entry(
            "sem_out_of_memory",
            "resource",
            Severity::Critical,
            "out of memory heap space gc overhead worker killed oom memory exhausted",
            "Worker Out of Memory",
            "A worker processing the task ran out of memory, typically on large datasets or skewed partitions.",
            &[
                "Dataset larger than the allocated worker memory",
                "Skewed data concentrating load on one partition",
                "Oversized join or aggregation",
            ],
            &[
                "Increase the worker memory or cluster size",
                "Repartition the data to even out the load",
                "Project away unused columns early in the flow",
            ],
            &["Right-size compute from observed data volumes", "Monitor memory in test runs"],
            "30-90 minutes",
        ),
        entry(
            "sem_disk_full",
            "resource",
            Severity::High,
            "no space left on device disk full storage exhausted temp files staging area full",
            "Disk Space Exhausted",
            "The runtime host or staging area ran out of disk space during the operation.",
            &[
                "Temp files from sorting or staging filled the disk",
                "Old logs never cleaned up",
                "Staging storage undersized for the data volume",
            ],
            &[
                "Free disk space on the runtime host",
                "Increase staging storage capacity",
                "Split the transfer into smaller chunks",
            ],
            &["Monitor disk space with alerts", "Auto-clean temp and log files"],
            "15-45 minutes",
        ),
        entry(
            "sem_token_expired",
            "authentication",
            Severity::Critical,
            "token expired acquire token failed service principal secret invalid client unauthorized",
            "Identity Token Acquisition Failure",
            "The identity provider could not issue an access token, blocking access to the protected resource.",
            &[
                "Service credential secret has expired",
                "Wrong tenant or client identifier configured",
                "Consent for the required permission never granted",
            ],
            &[
                "Regenerate the expired secret and update the connection",
                "Verify the tenant and client identifiers",
                "Grant admin consent for the required permissions",
            ],
            &["Alert on approaching secret expiry", "Prefer managed identities"],
            "15-45 minutes",
        ),
        entry(
            "sem_deadlock",
            "data",
            Severity::High,
            "deadlock lock request timeout blocked transaction victim 1205",
            "Database Deadlock or Lock Timeout",
            "Concurrent database operations blocked each other, and one was chosen as the deadlock victim.",
            &[
                "Concurrent writes to the same rows",
                "Long transactions holding locks",
                "Missing indexes forcing table scans",
            ],
            &[
                "Retry the failed operation",
                "Shorten transactions touching the contended table",
                "Add indexes to avoid full scans",
            ],
            &["Batch writes instead of row-by-row operations", "Schedule conflicting jobs apart"],
            "20-60 minutes",
        ),
        entry(
            "sem_encoding",
            "data",
            Severity::Medium,
            "invalid character malformed corrupt parse error utf-8 encoding codec bad row",
            "Encoding or Malformed Data",
            "The source contains characters or structure that cannot be decoded with the configured format.",
            &[
                "File encoding differs from the configured encoding",
                "Corrupted upload or transfer",
                "Inconsistent delimiters or line endings",
            ],
            &[
                "Set the correct encoding on the dataset definition",
                "Validate the file structure against the expected format",
                "Compare checksums with the source system",
            ],
            &["Standardise on UTF-8 end to end", "Validate files at pipeline start"],
            "15-45 minutes",
        ),
        entry(
            "sem_runtime_offline",
            "configuration",
            Severity::Critical,
            "integration runtime offline agent unavailable worker not running self-hosted disconnected",
            "Execution Runtime Offline",
            "The self-hosted execution runtime is offline or unreachable, so no task can be dispatched to it.",
            &[
                "Runtime service stopped on the host machine",
                "Host restarted or lost network connectivity",
                "Runtime version too old to connect",
            ],
            &[
                "Restart the runtime service on the host",
                "Verify the host is up and can reach the control plane",
                "Update the runtime to a supported version",
            ],
            &["Run the runtime highly available across nodes", "Monitor runtime health"],
            "10-30 minutes",
        ),
        entry(
            "sem_expression_error",
            "configuration",
            Severity::Medium,
            "expression evaluation failed parameter invalid template dynamic content undefined variable",
            "Expression or Parameter Evaluation Error",
            "A task expression or parameter reference failed to evaluate, usually a syntax or type problem.",
            &[
                "Syntax error in the dynamic expression",
                "Reference to an undefined parameter",
                "Type mismatch inside the expression",
            ],
            &[
                "Evaluate the expression against sample inputs",
                "Confirm every referenced parameter is defined with the right type",
                "Split complex expressions into intermediate variables",
            ],
            &["Test expressions in debug runs before publishing", "Name parameters consistently"],
            "10-30 minutes",
        ),
        entry(
            "sem_trigger_missed",
            "configuration",
            Severity::Medium,
            "trigger failed missed schedule window event trigger not firing cron",
            "Trigger Failure or Missed Window",
            "A schedule or event trigger failed to fire the workflow, or the window dependency was not met.",
            &[
                "Trigger left in a stopped state",
                "Incorrect schedule expression",
                "Event subscription misconfigured",
            ],
            &[
                "Check the trigger status and run history",
                "Validate the schedule expression against expected fire times",
                "Verify the event subscription for event-based triggers",
            ],
            &["Alert on missed trigger windows", "Test triggers before publishing"],
            "10-30 minutes",
        ),
        entry(
            "sem_truncation",
            "data",
            Severity::Medium,
            "data would be truncated value too large string too long overflow precision",
            "Data Truncation",
            "Source values exceed the size or precision of the destination column.",
            &[
                "Destination column narrower than source data",
                "Numeric precision overflow",
                "Unicode data loaded into a non-unicode column",
            ],
            &[
                "Widen the destination column",
                "Validate and trim values before loading",
                "Enable row-level fault tolerance with logging",
            ],
            &["Design destination schemas from profiled source data"],
            "15-45 minutes",
        ),
    ])
    .expect("builtin semantic corpus is valid")
}
