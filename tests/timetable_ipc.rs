use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_timetabled");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn timetabled");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert!(
        value.get("ok").and_then(|v| v.as_bool()).unwrap_or(false),
        "{} failed: {}",
        method,
        value
    );
    value.get("result").cloned().unwrap_or_else(|| json!({}))
}

fn error_code(value: &serde_json::Value) -> Option<&str> {
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_else(|| panic!("missing {key} in {value}"))
        .to_string()
}

struct School {
    c1: String,
    c2: String,
    math: String,
    sci: String,
    t1: String,
}

fn seed_school(stdin: &mut ChildStdin, reader: &mut BufReader<ChildStdout>) -> School {
    let c1 = request_ok(stdin, reader, "s1", "classes.create", json!({ "name": "7A" }));
    let c2 = request_ok(stdin, reader, "s2", "classes.create", json!({ "name": "7B" }));
    let math = request_ok(
        stdin,
        reader,
        "s3",
        "subjects.create",
        json!({ "name": "Mathematics", "code": "MATH" }),
    );
    let sci = request_ok(stdin, reader, "s4", "subjects.create", json!({ "name": "Science" }));
    let t1 = request_ok(stdin, reader, "s5", "teachers.create", json!({ "name": "Ada Byron" }));
    request_ok(
        stdin,
        reader,
        "s6",
        "slots.create",
        json!({ "slotId": "P1", "label": "Period 1", "startTime": "08:00", "endTime": "08:45" }),
    );
    request_ok(
        stdin,
        reader,
        "s7",
        "slots.create",
        json!({ "slotId": "P2", "label": "Period 2", "startTime": "08:45", "endTime": "09:30" }),
    );

    School {
        c1: str_field(&c1, "classId"),
        c2: str_field(&c2, "classId"),
        math: str_field(&math, "subjectId"),
        sci: str_field(&sci, "subjectId"),
        t1: str_field(&t1, "teacherId"),
    }
}

#[test]
fn double_booked_teacher_is_flagged_and_visible_in_views() {
    let workspace = temp_dir("timetabled-conflicts");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed_school(&mut stdin, &mut reader);

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.upsert",
        json!({
            "classId": s.c1, "day": "MONDAY", "slotId": "P1",
            "subjectId": s.math, "teacherId": s.t1
        }),
    );
    assert_eq!(first["conflicts"], json!([]));

    let second = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.upsert",
        json!({
            "classId": s.c2, "day": "MONDAY", "slotId": "P1",
            "subjectId": s.sci, "teacherId": s.t1
        }),
    );
    assert_eq!(second["conflicts"], json!([s.c1.clone()]));

    let check = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.conflicts",
        json!({ "classId": s.c1, "day": "MON", "slotId": "P1", "teacherId": s.t1 }),
    );
    assert_eq!(check["conflicts"], json!([s.c2.clone()]));

    let report = request_ok(&mut stdin, &mut reader, "5", "timetable.conflicts", json!({}));
    let records = report["records"].as_array().expect("records");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["day"], "MONDAY");
    assert_eq!(records[0]["classIds"].as_array().map(|a| a.len()), Some(2));

    let tv = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "timetable.teacherView",
        json!({ "teacherId": s.t1 }),
    );
    let cells = tv["cells"].as_array().expect("cells");
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0]["slotId"], "P1");
    assert_eq!(cells[0]["classes"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(tv["slots"].as_array().map(|a| a.len()), Some(2));
    assert_eq!(tv["slots"][0]["startTime"], "08:00");

    let cv = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "timetable.classView",
        json!({ "classId": s.c2 }),
    );
    let cells = cv["cells"].as_array().expect("cells");
    assert_eq!(cells.len(), 1);
    assert_eq!(cells[0]["subjectId"], json!(s.sci.clone()));
    assert_eq!(cv["days"].as_array().map(|a| a.len()), Some(6));
}

#[test]
fn invalid_reference_and_idempotent_clear() {
    let workspace = temp_dir("timetabled-invalid-ref");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed_school(&mut stdin, &mut reader);

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.upsert",
        json!({
            "classId": s.c1, "day": "TUESDAY", "slotId": "P2",
            "subjectId": s.math, "teacherId": s.t1
        }),
    );

    let bad = request(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.upsert",
        json!({
            "classId": s.c1, "day": "TUESDAY", "slotId": "P2",
            "subjectId": s.math, "teacherId": "no-such-teacher"
        }),
    );
    assert_eq!(error_code(&bad), Some("invalid_reference"));
    assert_eq!(bad["error"]["details"]["kind"], "teacher");

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.get",
        json!({ "classId": s.c1, "day": "TUESDAY", "slotId": "P2" }),
    );
    assert_eq!(got["assignment"]["teacherId"], json!(s.t1.clone()));

    let empty = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "timetable.get",
        json!({ "classId": s.c2, "day": "TUESDAY", "slotId": "P2" }),
    );
    assert!(empty["assignment"].is_null());

    let first = request_ok(
        &mut stdin,
        &mut reader,
        "6",
        "timetable.clear",
        json!({ "classId": s.c1, "day": "TUESDAY", "slotId": "P2" }),
    );
    assert_eq!(first["cleared"], true);
    let again = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "timetable.clear",
        json!({ "classId": s.c1, "day": "TUESDAY", "slotId": "P2" }),
    );
    assert_eq!(again["cleared"], false);

    let bad_day = request(
        &mut stdin,
        &mut reader,
        "8",
        "timetable.get",
        json!({ "classId": s.c1, "day": "SUNDAY", "slotId": "P2" }),
    );
    assert_eq!(error_code(&bad_day), Some("bad_params"));
}

#[test]
fn unknown_slot_is_a_persistence_failure_and_not_applied() {
    let workspace = temp_dir("timetabled-unknown-slot");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed_school(&mut stdin, &mut reader);

    let resp = request(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.upsert",
        json!({ "classId": s.c1, "day": "FRIDAY", "slotId": "P9", "subjectId": s.math }),
    );
    assert_eq!(error_code(&resp), Some("persistence_failed"));

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.get",
        json!({ "classId": s.c1, "day": "FRIDAY", "slotId": "P9" }),
    );
    assert!(got["assignment"].is_null());
}

#[test]
fn assignments_survive_restart() {
    let workspace = temp_dir("timetabled-restart");

    let class_id;
    {
        let (mut child, mut stdin, mut reader) = spawn_sidecar();
        request_ok(
            &mut stdin,
            &mut reader,
            "1",
            "workspace.select",
            json!({ "path": workspace.to_string_lossy() }),
        );
        let s = seed_school(&mut stdin, &mut reader);
        request_ok(
            &mut stdin,
            &mut reader,
            "2",
            "timetable.upsert",
            json!({
                "classId": s.c1, "day": "WEDNESDAY", "slotId": "P1",
                "subjectId": s.math, "teacherId": s.t1
            }),
        );
        class_id = s.c1;
        drop(stdin);
        child.wait().expect("sidecar exit");
    }

    let (_child, mut stdin, mut reader) = spawn_sidecar();
    let selected = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    assert_eq!(selected["assignmentCount"], 1);

    let got = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.get",
        json!({ "classId": class_id, "day": "WEDNESDAY", "slotId": "P1" }),
    );
    assert_eq!(got["assignment"]["day"], "WEDNESDAY");

    let classes = request_ok(&mut stdin, &mut reader, "5", "classes.list", json!({}));
    let counts: Vec<i64> = classes["classes"]
        .as_array()
        .expect("classes")
        .iter()
        .filter_map(|c| c["cellCount"].as_i64())
        .collect();
    assert_eq!(counts, vec![1, 0]);
}

#[test]
fn non_string_ids_are_rejected_and_the_cell_survives() {
    let workspace = temp_dir("timetabled-typed-edit");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed_school(&mut stdin, &mut reader);
    let cell = json!({ "classId": s.c1, "day": "MONDAY", "slotId": "P1" });

    request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.upsert",
        json!({
            "classId": s.c1, "day": "MONDAY", "slotId": "P1",
            "subjectId": s.math, "teacherId": s.t1
        }),
    );

    let numeric = request(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.upsert",
        json!({ "classId": s.c1, "day": "MONDAY", "slotId": "P1", "subjectId": 42 }),
    );
    assert_eq!(error_code(&numeric), Some("bad_params"));

    let both = request(
        &mut stdin,
        &mut reader,
        "4",
        "timetable.upsert",
        json!({
            "classId": s.c1, "day": "MONDAY", "slotId": "P1",
            "subjectId": 42, "teacherId": true
        }),
    );
    assert_eq!(error_code(&both), Some("bad_params"));

    let bulk = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "timetable.bulkUpdate",
        json!({ "edits": [
            { "classId": s.c1, "day": "MONDAY", "slotId": "P1", "teacherId": { "id": s.t1 } }
        ] }),
    );
    assert_eq!(bulk["updated"], 0);
    assert_eq!(bulk["errors"][0]["code"], "bad_params");

    let got = request_ok(&mut stdin, &mut reader, "6", "timetable.get", cell);
    assert_eq!(got["assignment"]["subjectId"], json!(s.math.clone()));
    assert_eq!(got["assignment"]["teacherId"], json!(s.t1.clone()));

    // Explicit nulls still clear.
    let cleared = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "timetable.upsert",
        json!({
            "classId": s.c1, "day": "mon", "slotId": "P1",
            "subjectId": null, "teacherId": null
        }),
    );
    assert!(cleared["assignment"].is_null());
}

#[test]
fn unreadable_slot_catalog_fails_the_views() {
    let workspace = temp_dir("timetabled-bad-slots");
    let (_child, mut stdin, mut reader) = spawn_sidecar();

    request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let s = seed_school(&mut stdin, &mut reader);

    let conn = rusqlite::Connection::open(workspace.join(timetabled::db::DB_FILE_NAME))
        .expect("open workspace db");
    conn.execute(
        "INSERT INTO time_slots(id, label, start_time, end_time)
         VALUES('PX', 'Broken', 'noon', 'later')",
        [],
    )
    .expect("insert broken slot");
    drop(conn);

    let cv = request(
        &mut stdin,
        &mut reader,
        "2",
        "timetable.classView",
        json!({ "classId": s.c1 }),
    );
    assert_eq!(error_code(&cv), Some("db_query_failed"));

    let tv = request(
        &mut stdin,
        &mut reader,
        "3",
        "timetable.teacherView",
        json!({ "teacherId": s.t1 }),
    );
    assert_eq!(error_code(&tv), Some("db_query_failed"));
}
