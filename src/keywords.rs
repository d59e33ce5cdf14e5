use anyhow::Result;
use std::collections::HashMap;
use std::fs;

/// The reserved lexemes the parser matches statements against. Every one of
/// them can be renamed through a JSON file mapping canonical names to
/// replacement spellings, e.g. `{"writeln": "PRINT", "begin": "START"}`.
#[derive(Debug, Clone)]
pub struct Keywords {
    pub begin: String,
    pub end: String,
    pub writeln: String,
    pub readln: String,
    pub if_: String,
    pub then: String,
    pub else_: String,
    pub while_: String,
    pub do_: String,
    pub for_: String,
    pub to: String,
    pub procedure: String,
}

impl Default for Keywords {
    fn default() -> Self {
        Keywords {
            begin: "BEGIN".into(),
            end: "END".into(),
            writeln: "WRITELN".into(),
            readln: "READLN".into(),
            if_: "IF".into(),
            then: "THEN".into(),
            else_: "ELSE".into(),
            while_: "WHILE".into(),
            do_: "DO".into(),
            for_: "FOR".into(),
            to: "TO".into(),
            procedure: "PROCEDURE".into(),
        }
    }
}

impl Keywords {
    /// Unknown canonical names are skipped, so a stale override file keeps
    /// working across keyword changes.
    pub fn rename(&mut self, canonical: &str, lexeme: String) {
        match canonical {
            "begin" => self.begin = lexeme,
            "end" => self.end = lexeme,
            "writeln" => self.writeln = lexeme,
            "readln" => self.readln = lexeme,
            "if" => self.if_ = lexeme,
            "then" => self.then = lexeme,
            "else" => self.else_ = lexeme,
            "while" => self.while_ = lexeme,
            "do" => self.do_ = lexeme,
            "for" => self.for_ = lexeme,
            "to" => self.to = lexeme,
            "procedure" => self.procedure = lexeme,
            _ => {}
        }
    }
}

pub fn load_keywords(path: Option<&str>) -> Result<Keywords> {
    let mut keywords = Keywords::default();
    if let Some(p) = path {
        let contents = fs::read_to_string(p)?;
        let overrides: HashMap<String, String> = serde_json::from_str(&contents)?;
        for (canonical, lexeme) in overrides {
            keywords.rename(&canonical, lexeme);
        }
    }
    Ok(keywords)
}
