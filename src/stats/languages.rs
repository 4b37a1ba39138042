//! Static file extension to language table.

/// Maps a lowercase file extension to its display language.
pub(super) fn language_for_extension(extension: &str) -> Option<&'static str> {
    let language = match extension {
        "js" => "JavaScript",
        "ts" => "TypeScript",
        "py" => "Python",
        "java" => "Java",
        "rb" => "Ruby",
        "go" => "Go",
        "rs" => "Rust",
        "cpp" => "C++",
        "c" => "C",
        "cs" => "C#",
        "php" => "PHP",
        "swift" => "Swift",
        "kt" => "Kotlin",
        "m" => "Objective-C",
        "scala" => "Scala",
        "sh" => "Shell",
        "md" => "Markdown",
        "json" => "JSON",
        "yml" | "yaml" => "YAML",
        "html" => "HTML",
        "css" => "CSS",
        "scss" => "SCSS",
        "less" => "LESS",
        "vue" => "Vue",
        "svelte" => "Svelte",
        "dart" => "Dart",
        "xml" => "XML",
        "txt" => "Text",
        "lock" => "Lockfile",
        "toml" => "TOML",
        "ini" => "INI",
        "dockerfile" => "Dockerfile",
        "makefile" => "Makefile",
        "bat" => "Batch",
        "ps1" => "PowerShell",
        "sql" => "SQL",
        "pl" => "Perl",
        "r" => "R",
        "jl" => "Julia",
        "lua" => "Lua",
        "groovy" => "Groovy",
        "gradle" => "Gradle",
        "coffee" => "CoffeeScript",
        "elm" => "Elm",
        "ex" | "exs" => "Elixir",
        "erl" => "Erlang",
        "hs" => "Haskell",
        "ml" => "OCaml",
        "clj" => "Clojure",
        "cljs" => "ClojureScript",
        "fs" | "fsx" => "F#",
        "vb" => "VB.NET",
        "vbs" => "VBScript",
        "pas" => "Pascal",
        "asm" => "Assembly",
        "sol" => "Solidity",
        "zig" => "Zig",
        "nim" => "Nim",
        "proto" => "Protobuf",
        "avro" => "Avro",
        "thrift" => "Thrift",
        "csv" => "CSV",
        "tsv" => "TSV",
        "conf" | "cfg" => "Config",
        "env" => "Env",
        "sample" => "Sample",
        "example" => "Example",
        "test" => "Test",
        "spec" => "Spec",
        "snap" => "Snapshot",
        "story" => "Story",
        "storybook" => "Storybook",
        "feature" => "Feature",
        _ => return None,
    };
    Some(language)
}

/// Display name for an extension: the table entry, or the uppercased
/// extension when unknown.
pub(super) fn display_language(extension: &str) -> String {
    let lowered = extension.to_ascii_lowercase();
    language_for_extension(&lowered)
        .map_or_else(|| lowered.to_ascii_uppercase(), ToOwned::to_owned)
}
