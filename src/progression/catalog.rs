use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

pub const DEFAULT_REWARD: u32 = 100;

fn default_reward() -> u32 {
    DEFAULT_REWARD
}

/// One multiple-choice quiz gating a module.
#[derive(Debug, Clone, Deserialize)]
pub struct Quiz {
    pub question: String,
    pub options: Vec<String>,
    pub answer: String,
}

/// One lesson+quiz unit. A user's level is the index of the next module they
/// may attempt; module `m` is unlocked iff `level >= m`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModuleDefinition {
    pub index: u32,
    pub title: String,
    pub theory: String,
    pub mission: String,
    pub hint: String,
    pub quiz: Quiz,
    #[serde(default = "default_reward")]
    pub reward: u32,
}

/// Static, ordered curriculum. Read-only to the progression core.
#[derive(Debug, Clone)]
pub struct ModuleCatalog {
    modules: Vec<ModuleDefinition>,
}

impl ModuleCatalog {
    pub fn new(modules: Vec<ModuleDefinition>) -> anyhow::Result<Self> {
        for (i, m) in modules.iter().enumerate() {
            let expected = (i + 1) as u32;
            anyhow::ensure!(
                m.index == expected,
                "module indices must be 1-based and sequential: found {} at position {}",
                m.index,
                expected
            );
            anyhow::ensure!(
                m.quiz.options.contains(&m.quiz.answer),
                "module {} quiz answer is not among its options",
                m.index
            );
        }
        Ok(Self { modules })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read module catalog {}", path.display()))?;
        let modules: Vec<ModuleDefinition> =
            serde_json::from_str(&raw).context("parse module catalog")?;
        Self::new(modules)
    }

    pub fn get(&self, index: u32) -> Option<&ModuleDefinition> {
        if index == 0 {
            return None;
        }
        self.modules.get((index - 1) as usize)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModuleDefinition> {
        self.modules.iter()
    }

    /// The built-in six-module Python curriculum.
    pub fn builtin() -> Self {
        let m = |index: u32,
                 title: &str,
                 theory: &str,
                 mission: &str,
                 hint: &str,
                 question: &str,
                 options: &[&str],
                 answer: &str| ModuleDefinition {
            index,
            title: title.to_string(),
            theory: theory.to_string(),
            mission: mission.to_string(),
            hint: hint.to_string(),
            quiz: Quiz {
                question: question.to_string(),
                options: options.iter().map(|o| o.to_string()).collect(),
                answer: answer.to_string(),
            },
            reward: DEFAULT_REWARD,
        };

        let modules = vec![
            m(
                1,
                "Module 1: Data Streams (Variables & I/O)",
                "Variables are labels pointing to memory. Dynamic typing: \
                 `x=10` is an int, `x='10'` a str. Casting: `int('5') + 5 = 10`. \
                 f-strings: `print(f'Agent {name}')`. Trap: `input()` always \
                 returns a string.",
                "The ID generator: ask for a name and birth year, compute the \
                 age, build a code from the first three letters of the name \
                 plus the age, and print `Identity: [code] // Verified`.",
                "Use `int()` for the year and `name[0:3]` for slicing.",
                "Output of: print(f'{10+5}' + '0')?",
                &["150", "1050", "Error"],
                "150",
            ),
            m(
                2,
                "Module 2: Logic Gates (Conditionals)",
                "Decision trees with `and`, `or`, `not`, and nested `if` \
                 blocks for layered checks.",
                "Bunker security: check a key card, a pass code of '1234' and \
                 a bio scan above 80. All pass prints 'Welcome', anything \
                 else prints 'Alarm'.",
                "Use `if key and code == '1234':`.",
                "Result of: True or False and False?",
                &["True", "False", "Error"],
                "True",
            ),
            m(
                3,
                "Module 3: Infinite Cycles (Loops)",
                "`range(start, stop, step)` drives for-loops; `break` stops, \
                 `continue` skips; while-loops run until the condition turns \
                 false.",
                "The brute force: with `secret = 7`, loop 1 to 10, print \
                 'Cracked' and break on a match, else print 'Scanning...'.",
                "Use `for i in range(1, 11):` and `if i == secret: break`.",
                "What does 'continue' do?",
                &["Stops loop", "Skips iteration", "Restarts loop"],
                "Skips iteration",
            ),
            m(
                4,
                "Module 4: The Armory (Lists)",
                "Slicing: `data[0:3]`, `data[::-1]` reverses. Methods: \
                 `.append()`, `.pop()`, `.remove()`, `.insert()`.",
                "Weapon loadout: start from ['Pistol', 'Knife', 'Smoke'], add \
                 'Sniper', remove 'Knife', insert 'Grenade' at index 1, print \
                 the last weapon.",
                "The last item is `list[-1]`; use `.insert(1, 'Item')`.",
                "list.pop(1) removes which index?",
                &["0", "1", "Last"],
                "1",
            ),
            m(
                5,
                "Module 5: Protocols (Functions)",
                "Functions take arguments and return values; \
                 `def attack(power=100):` gives a default.",
                "Damage calc: define `calc_dmg(base, mult)` returning \
                 `base * mult` and call it with (50, 1.5).",
                "Use `def` and `return`, and print the result.",
                "Variables inside functions are?",
                &["Global", "Local"],
                "Local",
            ),
            m(
                6,
                "Module 6: Failsafe (Errors)",
                "`try` wraps the risk, `except` catches, `finally` always \
                 runs. Catch `ValueError` or `ZeroDivisionError`.",
                "Safe divider: read two inputs, print their quotient, catch \
                 division by zero and non-numeric input separately.",
                "Wrap the input and print in `try:` with `except` blocks \
                 below.",
                "Code in 'finally' runs...",
                &["On Error", "Always"],
                "Always",
            ),
        ];

        Self::new(modules).expect("builtin catalog is well-formed")
    }
}
