use std::{
    collections::HashMap,
    fs,
    path::{Path, PathBuf},
    process::Command,
};

use smithay::input::keyboard::{Keysym, ModifiersState};

use crate::{ShellError, workspace::WorkspaceId};

#[derive(Clone, Debug)]
pub struct RuntimeConfig {
    pub main_key: MainKey,
    pub keybinds: Vec<Keybind>,
    pub autostart: Vec<String>,
    pub terminal: String,
    pub launcher: String,
    pub lock_command: String,
    pub mixer_command: String,
    /// Ask clients to leave decorations to the shell.
    pub no_csd: bool,
    pub natural_scroll: bool,
    pub cursor_wrap: bool,
    pub cursor_theme: String,
    pub cursor_size: u32,
    pub font_family: Option<String>,
}

impl RuntimeConfig {
    pub fn keybind_action_for(
        &self,
        modifiers: &ModifiersState,
        keysym: Keysym,
    ) -> Option<KeybindAction> {
        self.keybinds
            .iter()
            .find(|bind| bind.matches(modifiers, keysym))
            .map(|bind| bind.action.clone())
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        let main_key = MainKey::Super;
        let keybinds =
            default_keybinds(main_key).expect("default keybinds are static and must be valid");
        Self {
            main_key,
            keybinds,
            autostart: Vec::new(),
            terminal: "foot".to_owned(),
            launcher: "fuzzel".to_owned(),
            lock_command: "swaylock".to_owned(),
            mixer_command: "pavucontrol".to_owned(),
            no_csd: true,
            natural_scroll: true,
            cursor_wrap: true,
            cursor_theme: "default".to_owned(),
            cursor_size: 24,
            font_family: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MainKey {
    Super,
    Alt,
    Ctrl,
}

impl MainKey {
    pub fn matches(self, modifiers: &ModifiersState) -> bool {
        match self {
            MainKey::Super => modifiers.logo,
            MainKey::Alt => modifiers.alt,
            MainKey::Ctrl => modifiers.ctrl,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Keybind {
    pub modifiers: KeybindModifiers,
    pub key: String,
    pub action: KeybindAction,
}

impl Keybind {
    fn matches(&self, modifiers: &ModifiersState, keysym: Keysym) -> bool {
        self.modifiers.matches(modifiers) && keysym_matches_token(keysym, &self.key)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KeybindModifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub logo: bool,
}

impl KeybindModifiers {
    fn set_main_key(&mut self, main_key: MainKey) {
        match main_key {
            MainKey::Super => self.logo = true,
            MainKey::Alt => self.alt = true,
            MainKey::Ctrl => self.ctrl = true,
        }
    }

    fn matches(self, modifiers: &ModifiersState) -> bool {
        self.shift == modifiers.shift
            && self.ctrl == modifiers.ctrl
            && self.alt == modifiers.alt
            && self.logo == modifiers.logo
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KeybindAction {
    Exec(String),
    Terminal,
    Launcher,
    Lock,
    Mixer,
    CloseFocused,
    ToggleFullscreen,
    ToggleMaximize,
    ToggleFind,
    FocusLast,
    Quit,
    ReloadConfig,
    SwitchWorkspace(WorkspaceId),
    MoveFocusedToWorkspace(WorkspaceId),
}

pub struct LoadedConfig {
    pub path: PathBuf,
    pub config: RuntimeConfig,
}

pub fn load_or_create_default() -> Result<LoadedConfig, ShellError> {
    let path = config_path()?;
    if !path.exists() {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                ShellError::Config(format!(
                    "failed to create config directory {}: {err}",
                    parent.display()
                ))
            })?;
        }
        write_default_config(&path)?;
        tracing::info!(path = %path.display(), "created default config.lua");
    }

    let config = load_from_path(&path)?;
    Ok(LoadedConfig { path, config })
}

pub fn load_from_path(path: &Path) -> Result<RuntimeConfig, ShellError> {
    if !path.exists() {
        return Err(ShellError::Config(format!(
            "config file not found: {}",
            path.display()
        )));
    }

    let content = fs::read_to_string(path).map_err(|err| {
        ShellError::Config(format!("failed to read config {}: {err}", path.display()))
    })?;
    if content.trim().is_empty() {
        write_default_config(path)?;
        tracing::info!(path = %path.display(), "config.lua was empty; wrote default config");
    }

    let values = load_lua_values(path)?;
    config_from_values(&values)
}

fn write_default_config(path: &Path) -> Result<(), ShellError> {
    fs::write(path, default_config_template()).map_err(|err| {
        ShellError::Config(format!(
            "failed to write default config {}: {err}",
            path.display()
        ))
    })
}

/// Build a config from the flattened `key=value` pairs the lua loader emits.
pub fn config_from_values(values: &HashMap<String, String>) -> Result<RuntimeConfig, ShellError> {
    let mut config = RuntimeConfig::default();

    if let Some(value) = values.get("main_key").or_else(|| values.get("modkey")) {
        config.main_key = parse_main_key(value)?;
    }

    if let Some(value) = values.get("terminal") {
        config.terminal = value.clone();
    }
    if let Some(value) = values.get("launcher") {
        config.launcher = value.clone();
    }
    if let Some(value) = values.get("lock_command") {
        config.lock_command = value.clone();
    }
    if let Some(value) = values.get("mixer_command") {
        config.mixer_command = value.clone();
    }

    config.no_csd = parse_bool_flexible(values, "no_csd", config.no_csd)?;
    config.natural_scroll = parse_bool_flexible(values, "natural_scroll", config.natural_scroll)?;
    config.cursor_wrap = parse_bool_flexible(values, "cursor_wrap", config.cursor_wrap)?;

    if let Some(value) = values.get("cursor_theme") {
        config.cursor_theme = value.clone();
    }
    config.cursor_size = parse_u32(values, "cursor_size", config.cursor_size)?;
    if config.cursor_size == 0 {
        return Err(ShellError::Config(
            "cursor_size must be greater than 0".to_owned(),
        ));
    }

    config.font_family = values
        .get("font_family")
        .map(|raw| raw.trim())
        .filter(|raw| !raw.is_empty())
        .map(str::to_owned);

    config.autostart = collect_indexed_values(values, "autostart.")?;

    let keybind_lines = collect_indexed_values(values, "keybind.")?;
    config.keybinds = if keybind_lines.is_empty() {
        default_keybinds(config.main_key)?
    } else {
        keybind_lines
            .iter()
            .map(|line| parse_keybind_line(line, config.main_key))
            .collect::<Result<Vec<_>, _>>()?
    };

    Ok(config)
}

pub fn config_path() -> Result<PathBuf, ShellError> {
    if let Some(xdg) = std::env::var_os("XDG_CONFIG_HOME")
        && !xdg.is_empty()
    {
        return Ok(PathBuf::from(xdg).join("bevel").join("config.lua"));
    }

    if let Some(home) = std::env::var_os("HOME")
        && !home.is_empty()
    {
        return Ok(PathBuf::from(home)
            .join(".config")
            .join("bevel")
            .join("config.lua"));
    }

    Err(ShellError::Config(
        "unable to resolve config path: HOME and XDG_CONFIG_HOME are unset".to_owned(),
    ))
}

fn load_lua_values(path: &Path) -> Result<HashMap<String, String>, ShellError> {
    let output = Command::new("lua")
        .arg("-e")
        .arg(lua_loader_script())
        .env("BEVEL_CONFIG_PATH", path)
        .output()
        .map_err(|err| ShellError::Config(format!("failed to execute lua: {err}")))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_owned();
        let reason = if stderr.is_empty() {
            "lua exited with non-zero status".to_owned()
        } else {
            stderr
        };
        return Err(ShellError::Config(format!(
            "failed to load {}: {reason}",
            path.display()
        )));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    parse_key_value_stdout(&stdout)
}

fn parse_key_value_stdout(stdout: &str) -> Result<HashMap<String, String>, ShellError> {
    let mut values = HashMap::new();
    for line in stdout.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            return Err(ShellError::Config(format!("invalid lua output line: {line}")));
        };
        values.insert(key.to_owned(), value.to_owned());
    }
    Ok(values)
}

fn collect_indexed_values(
    values: &HashMap<String, String>,
    prefix: &str,
) -> Result<Vec<String>, ShellError> {
    let mut indexed = Vec::<(usize, String)>::new();

    for (key, value) in values {
        let Some(index_str) = key.strip_prefix(prefix) else {
            continue;
        };

        let index = index_str.parse::<usize>().map_err(|err| {
            ShellError::Config(format!(
                "invalid indexed key `{key}`: index is not a number ({err})"
            ))
        })?;
        indexed.push((index, value.clone()));
    }

    indexed.sort_by_key(|(index, _)| *index);
    Ok(indexed.into_iter().map(|(_, value)| value).collect())
}

fn parse_main_key(raw: &str) -> Result<MainKey, ShellError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "super" | "logo" | "win" | "windows" | "mod4" => Ok(MainKey::Super),
        "alt" | "mod1" => Ok(MainKey::Alt),
        "ctrl" | "control" => Ok(MainKey::Ctrl),
        _ => Err(ShellError::Config(format!(
            "invalid main_key/modkey `{raw}` (expected Super/Mod4, Alt/Mod1, or Ctrl)"
        ))),
    }
}

fn default_keybinds(main_key: MainKey) -> Result<Vec<Keybind>, ShellError> {
    const DEFAULT_BINDS: &[&str] = &[
        "Main+Return terminal",
        "Main+D launcher",
        "Main+Shift+Q close",
        "Main+F fullscreen",
        "Main+M maximize",
        "Main+Shift+F find",
        "Main+Shift+L lock",
        "Main+A mixer",
        "Main+Tab focus_last",
        "Main+Shift+E quit",
        "Main+Shift+R reload_config",
    ];

    DEFAULT_BINDS
        .iter()
        .map(|line| parse_keybind_line(line, main_key))
        .collect()
}

pub fn parse_keybind_line(line: &str, main_key: MainKey) -> Result<Keybind, ShellError> {
    let trimmed = line.trim();
    let mut parts = trimmed.split_whitespace();
    let Some(combo) = parts.next() else {
        return Err(ShellError::Config(
            "keybind entry must not be empty".to_owned(),
        ));
    };
    let action_name = parts.next().ok_or_else(|| {
        ShellError::Config(format!(
            "invalid keybind `{trimmed}`: missing action (expected format `<combo> <action> [args]`)"
        ))
    })?;
    let action_args = parts.collect::<Vec<_>>().join(" ");

    let (modifiers, key) = parse_combo(combo, main_key)?;
    let action = parse_keybind_action(action_name, action_args.as_str(), trimmed)?;

    Ok(Keybind {
        modifiers,
        key,
        action,
    })
}

fn parse_combo(combo: &str, main_key: MainKey) -> Result<(KeybindModifiers, String), ShellError> {
    let mut modifiers = KeybindModifiers::default();
    let mut key: Option<String> = None;

    for raw_part in combo.split('+') {
        let part = raw_part.trim();
        if part.is_empty() {
            return Err(ShellError::Config(format!(
                "invalid key combo `{combo}`: empty segment"
            )));
        }

        match part.to_ascii_lowercase().as_str() {
            "shift" => modifiers.shift = true,
            "ctrl" | "control" => modifiers.ctrl = true,
            "alt" | "mod1" => modifiers.alt = true,
            "super" | "logo" | "win" | "windows" | "mod4" => modifiers.logo = true,
            "main" => modifiers.set_main_key(main_key),
            _ => {
                if key.is_some() {
                    return Err(ShellError::Config(format!(
                        "invalid key combo `{combo}`: multiple key tokens"
                    )));
                }
                key = Some(normalize_key_token(part));
            }
        }
    }

    let key = key.ok_or_else(|| {
        ShellError::Config(format!(
            "invalid key combo `{combo}`: missing non-modifier key"
        ))
    })?;

    Ok((modifiers, key))
}

fn normalize_key_token(raw: &str) -> String {
    let mut chars = raw.chars();
    if let (Some(ch), None) = (chars.next(), chars.next()) {
        if ch.is_ascii_alphabetic() {
            return ch.to_ascii_uppercase().to_string();
        }
        return ch.to_string();
    }

    match raw.to_ascii_uppercase().as_str() {
        "ENTER" => "RETURN".to_owned(),
        "ESC" => "ESCAPE".to_owned(),
        "SPACEBAR" => "SPACE".to_owned(),
        other => other.to_owned(),
    }
}

fn parse_keybind_action(
    action_name: &str,
    action_args: &str,
    full_line: &str,
) -> Result<KeybindAction, ShellError> {
    let action = match action_name.to_ascii_lowercase().as_str() {
        "exec" | "spawn" => {
            if action_args.trim().is_empty() {
                return Err(ShellError::Config(format!(
                    "invalid keybind `{full_line}`: `exec` requires a command"
                )));
            }
            KeybindAction::Exec(action_args.trim().to_owned())
        }
        "terminal" => KeybindAction::Terminal,
        "launcher" => KeybindAction::Launcher,
        "lock" => KeybindAction::Lock,
        "mixer" => KeybindAction::Mixer,
        "close" | "close_focused" | "close_window" => KeybindAction::CloseFocused,
        "fullscreen" | "togglefullscreen" => KeybindAction::ToggleFullscreen,
        "maximize" | "togglemaximize" => KeybindAction::ToggleMaximize,
        "find" | "find_window" => KeybindAction::ToggleFind,
        "focus_last" | "last_window" => KeybindAction::FocusLast,
        "quit" | "exit" => KeybindAction::Quit,
        "reload" | "reload_config" => KeybindAction::ReloadConfig,
        "workspace" => KeybindAction::SwitchWorkspace(parse_workspace(
            action_args,
            full_line,
            "workspace",
        )?),
        "movetoworkspace" => KeybindAction::MoveFocusedToWorkspace(parse_workspace(
            action_args,
            full_line,
            "movetoworkspace",
        )?),
        _ => {
            return Err(ShellError::Config(format!(
                "invalid keybind `{full_line}`: unknown action `{action_name}`"
            )));
        }
    };

    if !matches!(
        action,
        KeybindAction::Exec(_)
            | KeybindAction::SwitchWorkspace(_)
            | KeybindAction::MoveFocusedToWorkspace(_)
    ) && !action_args.trim().is_empty()
    {
        return Err(ShellError::Config(format!(
            "invalid keybind `{full_line}`: action `{action_name}` does not accept arguments"
        )));
    }

    Ok(action)
}

fn parse_workspace(
    action_args: &str,
    full_line: &str,
    action_name: &str,
) -> Result<WorkspaceId, ShellError> {
    let raw = action_args.trim();
    if raw.is_empty() {
        return Err(ShellError::Config(format!(
            "invalid keybind `{full_line}`: action `{action_name}` requires workspace number"
        )));
    }

    let number = raw.parse::<u8>().map_err(|err| {
        ShellError::Config(format!(
            "invalid keybind `{full_line}`: invalid workspace number `{raw}` ({err})"
        ))
    })?;

    WorkspaceId::new(number).ok_or_else(|| {
        ShellError::Config(format!(
            "invalid keybind `{full_line}`: workspace must be between 1 and 9"
        ))
    })
}

fn keysym_matches_token(keysym: Keysym, token: &str) -> bool {
    let mut chars = token.chars();
    if let (Some(token_char), None) = (chars.next(), chars.next()) {
        if token_char.is_ascii_digit() {
            return digit_matches_keysym(token_char, keysym);
        }

        if token_char.is_ascii_alphabetic() {
            return keysym
                .key_char()
                .is_some_and(|ch| ch.eq_ignore_ascii_case(&token_char));
        }

        return keysym.key_char() == Some(token_char);
    }

    match token {
        "RETURN" => matches!(keysym, Keysym::Return | Keysym::KP_Enter),
        "ESCAPE" => keysym == Keysym::Escape,
        "PRINT" => keysym == Keysym::Print,
        "SPACE" => keysym.key_char() == Some(' '),
        "TAB" => matches!(keysym, Keysym::Tab | Keysym::ISO_Left_Tab | Keysym::KP_Tab),
        "LEFT" => keysym == Keysym::Left,
        "RIGHT" => keysym == Keysym::Right,
        "UP" => keysym == Keysym::Up,
        "DOWN" => keysym == Keysym::Down,
        "BACKSPACE" => keysym == Keysym::BackSpace,
        _ => false,
    }
}

fn digit_matches_keysym(digit: char, keysym: Keysym) -> bool {
    let Some(workspace) = WorkspaceId::from_keysym(keysym) else {
        return false;
    };
    digit.to_digit(10) == Some(u32::from(workspace.get()))
}

fn parse_u32(values: &HashMap<String, String>, key: &str, default: u32) -> Result<u32, ShellError> {
    match values.get(key) {
        Some(raw) => raw.parse::<u32>().map_err(|err| {
            ShellError::Config(format!("invalid value for {key}: {raw} ({err})"))
        }),
        None => Ok(default),
    }
}

fn parse_bool_flexible(
    values: &HashMap<String, String>,
    key: &str,
    default: bool,
) -> Result<bool, ShellError> {
    let Some(raw) = values.get(key) else {
        return Ok(default);
    };

    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ShellError::Config(format!(
            "invalid value for {key}: {raw} (expected bool or 0/1)"
        ))),
    }
}

fn default_config_template() -> &'static str {
    r#"-- bevel config
-- File: ~/.config/bevel/config.lua (or $XDG_CONFIG_HOME/bevel/config.lua)
return {
  general = {
    modkey = "Super",
    terminal = "foot",
    launcher = "fuzzel",
    lock_command = "swaylock",
    mixer_command = "pavucontrol",
    no_csd = true,
    natural_scroll = true,
    cursor_wrap = true,
  },

  cursor = {
    theme = "default",
    size = 24,
  },

  font = {
    -- family = "DejaVu Sans",
  },

  -- Leave empty to keep the built-in shortcuts. Main+1..9 and
  -- Main+Shift+1..9 (workspaces) and Main+Arrow (snapping) always apply.
  keybindings = {
    -- { combo = "Main+Return", action = "terminal" },
    -- { combo = "Main+B", action = "exec", command = "firefox" },
  },

  autostart = {
    -- "mako",
  },
}
"#
}

fn lua_loader_script() -> &'static str {
    r#"
local path = os.getenv("BEVEL_CONFIG_PATH")
if type(path) ~= "string" or path == "" then
  io.stderr:write("BEVEL_CONFIG_PATH is not set\n")
  os.exit(1)
end

local chunk, load_err = loadfile(path)
if not chunk then
  io.stderr:write(load_err .. "\n")
  os.exit(1)
end

local ok, result = pcall(chunk)
if not ok then
  io.stderr:write(result .. "\n")
  os.exit(1)
end

local cfg = type(result) == "table" and result or {}

local function emit(key, value)
  io.write(key, "=", tostring(value), "\n")
end

local function pick(primary, fallback)
  if primary ~= nil then
    return primary
  end
  return fallback
end

local function expect_table(name, value)
  if value ~= nil and type(value) ~= "table" then
    io.stderr:write(name .. " must be a table\n")
    os.exit(1)
  end
end

local function emit_typed(name, value, kinds)
  if value == nil then
    return
  end
  for _, kind in ipairs(kinds) do
    if type(value) == kind then
      emit(name, value)
      return
    end
  end
  io.stderr:write(name .. " must be a " .. table.concat(kinds, " or ") .. "\n")
  os.exit(1)
end

expect_table("general", cfg.general)
expect_table("cursor", cfg.cursor)
expect_table("font", cfg.font)
local general = cfg.general or {}
local cursor = cfg.cursor or {}
local font = cfg.font or {}

emit_typed("main_key", pick(general.main_key, cfg.main_key), { "string" })
emit_typed("modkey", pick(general.modkey, cfg.modkey), { "string" })
emit_typed("terminal", pick(general.terminal, cfg.terminal), { "string" })
emit_typed("launcher", pick(general.launcher, cfg.launcher), { "string" })
emit_typed("lock_command", pick(general.lock_command, cfg.lock_command), { "string" })
emit_typed("mixer_command", pick(general.mixer_command, cfg.mixer_command), { "string" })
emit_typed("no_csd", pick(general.no_csd, cfg.no_csd), { "boolean", "number" })
emit_typed("natural_scroll", pick(general.natural_scroll, cfg.natural_scroll), { "boolean", "number" })
emit_typed("cursor_wrap", pick(general.cursor_wrap, cfg.cursor_wrap), { "boolean", "number" })
emit_typed("cursor_theme", pick(cursor.theme, cfg.cursor_theme), { "string" })
emit_typed("cursor_size", pick(cursor.size, cfg.cursor_size), { "number" })
emit_typed("font_family", pick(font.family, cfg.font_family), { "string" })

local keybinds = pick(cfg.keybindings, cfg.keybinds)
expect_table("keybindings", keybinds)
for index, entry in ipairs(keybinds or {}) do
  if type(entry) == "string" then
    emit("keybind." .. index, entry)
  elseif type(entry) == "table" then
    local combo = pick(entry.combo, entry[1])
    local action = pick(entry.action, entry[2])
    local arg = pick(entry.arg, pick(entry.command, entry[3]))
    if combo == nil or action == nil then
      io.stderr:write("keybindings[" .. index .. "] needs combo and action\n")
      os.exit(1)
    end
    if arg ~= nil and tostring(arg) ~= "" then
      emit("keybind." .. index, tostring(combo) .. " " .. tostring(action) .. " " .. tostring(arg))
    else
      emit("keybind." .. index, tostring(combo) .. " " .. tostring(action))
    end
  else
    io.stderr:write("keybindings[" .. index .. "] must be string or table\n")
    os.exit(1)
  end
end

local autostart = cfg.autostart
expect_table("autostart", autostart)
for index, command in ipairs(autostart or {}) do
  if type(command) ~= "string" then
    io.stderr:write("autostart[" .. index .. "] must be a string\n")
    os.exit(1)
  end
  emit("autostart." .. index, command)
end
"#
}
