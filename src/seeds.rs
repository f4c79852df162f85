//! Seed data: the built-in exercise bank.

use crate::domain::{Exercise, ExerciseSource};

fn seed(id: &str, title: &str, description: &str, initial_code: &str, expected: &str, hints: &[&str]) -> Exercise {
  Exercise {
    id: id.into(),
    title: title.into(),
    description: description.into(),
    initial_code: initial_code.into(),
    expected_output: Some(expected.into()),
    hints: hints.iter().map(|h| h.to_string()).collect(),
    source: ExerciseSource::Seed,
  }
}

/// Minimal set of built-in exercises that guarantee the app
/// is useful even without external config.
pub fn seed_exercises() -> Vec<Exercise> {
  vec![
    seed(
      "ex1-5-1",
      "はじめてのPythonコード",
      "「Hello, Python!」と出力するコードを書いて実行してみましょう。",
      "# ここにコードを書いてください\n",
      "Hello, Python!",
      &[
        "print()関数を使います",
        "文字列はダブルクォート(\")またはシングルクォート(')で囲みます",
        "正解: print(\"Hello, Python!\")",
      ],
    ),
    seed(
      "ex1-6-1",
      "複数行の出力",
      "3行にわたって「1」「2」「3」と出力するコードを書いてください。",
      "# 3行にわたって1, 2, 3を出力してください\n",
      "1\n2\n3",
      &[
        "print()を3回使います",
        "各行でprint(1)、print(2)、print(3)と書きます",
        "数字はクォートで囲む必要はありません",
      ],
    ),
    seed(
      "ex2-1-1",
      "変数の作成",
      "変数 greeting に「こんにちは」という文字列を代入し、それをprint文で出力してください。",
      "# greeting変数を作成し、「こんにちは」を代入してください\n\n# greeting を出力してください\n",
      "こんにちは",
      &[
        "変数への代入は = を使います",
        "文字列はクォートで囲みます",
        "greeting = \"こんにちは\" と書きます",
        "出力は print(greeting) です",
      ],
    ),
    seed(
      "ex2-3-1",
      "f文字列の練習",
      "変数 product に「りんご」、price に 150 を代入し、f文字列を使って「りんごは150円です」と出力してください。",
      "# product と price を定義してください\n\n# f文字列で「〇〇は△△円です」と出力してください\n",
      "りんごは150円です",
      &[
        "product = \"りんご\" と price = 150 を定義",
        "f文字列は f\"...\" の形式で書きます",
        "{product} と {price} で変数の値を埋め込みます",
        "print(f\"{product}は{price}円です\")",
      ],
    ),
    seed(
      "ex3-1-1",
      "点数判定",
      "score変数が70以上のとき「合格」と出力するif文を書いてください。",
      "score = 75\n\n# scoreが70以上なら「合格」と出力してください\n",
      "合格",
      &[
        "if score >= 70: と条件を書きます",
        "インデント（字下げ）を忘れずに",
        "print(\"合格\") で出力します",
      ],
    ),
    seed(
      "ex4-1-1",
      "1から5まで出力",
      "for文を使って1から5までの数字を順番に出力してください。",
      "# 1から5までを出力してください\n",
      "1\n2\n3\n4\n5",
      &[
        "range(1, 6)で1から5までの数列が作れます",
        "for i in range(1, 6): と書きます",
        "ループ内で print(i) を実行",
      ],
    ),
  ]
}
