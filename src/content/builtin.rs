//! Built-in example content.

use std::collections::BTreeMap;

use super::store::{ContentEntry, LabReference, Layout, Recipe, Topic};

pub(super) fn topics() -> BTreeMap<String, Topic> {
    BTreeMap::from([
        ("exercise".to_owned(), exercise()),
        ("meditation".to_owned(), meditation()),
        ("yoga".to_owned(), yoga()),
        ("nutrition".to_owned(), nutrition()),
    ])
}

fn exercise() -> Topic {
    Topic {
        menu_label: "🏋️ Exercise".to_owned(),
        header: "🏃 Workouts: pick a comfortable pace and listen to your body.".to_owned(),
        layout: Layout::Blocks,
        default_count: 3,
        count_options: vec![3, 5, 7, 10],
        entries: vec![
            ContentEntry::new("Morning tone (10 min)", &[
                "Stretch up 30 s",
                "Squats 15",
                "Wall push-ups 10",
                "Plank 40 s",
                "March in place 60 s",
            ]),
            ContentEntry::new("Quick cardio (8 min)", &[
                "Jumping jacks 40 s",
                "Run in place 40 s",
                "High knees 30 s",
                "Rest 30 s",
                "Repeat for 2 rounds",
            ]),
            ContentEntry::new("Core strength", &[
                "Plank 3×30 s",
                "Side plank 2×20 s",
                "Crunches 3×20",
                "Flutter kicks 3×30 s",
            ]),
            ContentEntry::new("Legs and glutes", &[
                "Squat 3×15",
                "Lunges 3×10 per leg",
                "Glute bridge 3×15",
                "Calf raises 3×20",
            ]),
            ContentEntry::new("Back and posture", &[
                "Superman 3×12",
                "Glute bridge 3×15",
                "Lower back stretch 60 s",
            ]),
            ContentEntry::new("Office micro-break (5 min)", &[
                "Shoulder circles 30 s",
                "Neck stretch 30 s",
                "Side bends 10",
                "Shoulder blade squeezes 20",
            ]),
            ContentEntry::new("HIIT-6", &[
                "30 s walk / 30 s jumps ×6",
                "Rest 60 s",
                "Repeat if you feel strong",
            ]),
            ContentEntry::new("Arm strength", &[
                "Chair push-ups 3×10",
                "Bench dips 3×8",
                "Isometric hold 30 s",
            ]),
            ContentEntry::new("Balance and legs", &[
                "Single-leg stand 2×30 s",
                "Side lunges 3×12",
                "Stretch 60 s",
            ]),
            ContentEntry::new("Light cardio (20 min)", &["Walk or step for 20 minutes at a comfortable heart rate"]),
            ContentEntry::new("Core stability", &[
                "Forearm plank 3×40 s",
                "Russian twists 3×20",
                "Plank with leg lift 2×10 per leg",
            ]),
            ContentEntry::new("Interval ladder", &["40 s work / 20 s rest ×8: run, jumps, squats"]),
            ContentEntry::new("Full circuit (12 min)", &[
                "Squats 40 s",
                "Push-ups 30 s",
                "Plank 30 s",
                "Crunches 40 s",
            ]),
            ContentEntry::new("After-work stretch", &[
                "Hamstring stretch 30 s",
                "Quad stretch 30 s",
                "Lower back 30 s",
                "Child's pose 60 s",
            ]),
            ContentEntry::new("Functional at home", &[
                "Sit-to-stand 3×12",
                "Weight shifts 2×20",
                "Balance 2×30 s",
            ]),
            ContentEntry::new("Dynamic warm-up", &[
                "Hip circles 30 s",
                "Knee raises 30 s",
                "Side bends 20",
            ]),
            ContentEntry::new("Mini strength", &[
                "Squat 4×12",
                "Lunges 3×10",
                "Push-ups 3×8",
                "Plank 3×30 s",
            ]),
            ContentEntry::new("Shoulders and upper back", &[
                "Arm circles 30 s",
                "Y-T-W raises 2×8",
                "Chest stretch 30 s",
            ]),
            ContentEntry::new("Cardio energy", &[
                "Easy burpees 3×10",
                "Jump rope 2×60 s",
                "Brisk walk 5 min",
            ]),
            ContentEntry::new("Evening unwind", &[
                "Slow forward bends 10",
                "Cat-cow 8 cycles",
                "Corpse pose 3-5 min",
            ]),
        ],
    }
}

fn meditation() -> Topic {
    Topic {
        menu_label: "🧘 Meditation".to_owned(),
        header: "🧘 Breathing and meditation: practice somewhere calm.".to_owned(),
        layout: Layout::Blocks,
        default_count: 3,
        count_options: vec![3, 5, 7, 10],
        entries: vec![
            ContentEntry::new("Box breathing 4-4-4-4", &[
                "Inhale 4",
                "Hold 4",
                "Exhale 4",
                "Hold 4",
                "Repeat 6-10 cycles",
            ]),
            ContentEntry::new("4-7-8", &["Inhale 4", "Hold 7", "Exhale 8", "3-6 cycles"]),
            ContentEntry::new("Coherent 5/5", &["Inhale 5", "Exhale 5", "5-10 minutes"]),
            ContentEntry::new("Long exhale 1:2", &["Inhale 4", "Exhale 8", "3-5 minutes"]),
            ContentEntry::new("Diaphragmatic breathing", &[
                "Hand on belly, breathe through the nose into the palm",
                "5-7 minutes",
            ]),
            ContentEntry::new("Ujjayi breath", &["Soft sound in the throat on the exhale", "3-5 minutes"]),
            ContentEntry::new("Progressive relaxation", &[
                "Tense and release muscle groups from head to toe",
                "10 minutes",
            ]),
            ContentEntry::new("Body scan", &["Move attention zone by zone from head to feet", "5-12 minutes"]),
            ContentEntry::new("Walking rhythm 4/6", &[
                "While walking: inhale for 4 steps, exhale for 6",
                "10-20 minutes",
            ]),
            ContentEntry::new("Three deep exhales", &["Three slow deep exhales, dropping the shoulders"]),
            ContentEntry::new("Grounding 5-4-3-2-1", &[
                "Name 5 things you see, 4 you hear, 3 you feel...",
                "2-3 minutes",
            ]),
            ContentEntry::new("Metta", &["Send kind wishes to yourself, then to others", "5 minutes"]),
            ContentEntry::new("Breath visualization", &["Imagine the air softening the body", "5-8 minutes"]),
            ContentEntry::new("Pump breath", &["Two short inhales and one long exhale", "1-2 minutes"]),
            ContentEntry::new("Counting breaths", &["Count breaths up to 10 quietly, then back down", "5 minutes"]),
            ContentEntry::new("Energizer 3/3", &["Short 3/3 rhythm when tired", "2-4 minutes"]),
            ContentEntry::new("Seated belly breathing", &["Palm on belly, breathe softly into it", "5 minutes"]),
            ContentEntry::new("One-minute meditation", &["One minute of slow breathing and body awareness"]),
            ContentEntry::new("Wind-down for sleep", &[
                "Exhale 1.5-2× longer than the inhale",
                "5-10 minutes before bed",
            ]),
            ContentEntry::new("Mindful breathing", &["Focus on a point at the nostrils", "5-10 minutes"]),
        ],
    }
}

fn yoga() -> Topic {
    Topic {
        menu_label: "🌀 Yoga".to_owned(),
        header: "🌿 Yoga: move gently, never force the range.".to_owned(),
        layout: Layout::Blocks,
        default_count: 3,
        count_options: vec![3, 5, 7, 10],
        entries: vec![
            ContentEntry::new("Tadasana (Mountain)", &[
                "Stand tall, feet together or hip-width",
                "Lengthen through the crown",
                "Breathe evenly 6-10 cycles",
            ]),
            ContentEntry::new("Vrikshasana (Tree)", &[
                "Balance on one leg",
                "Foot to the inner thigh",
                "30-60 s per leg",
            ]),
            ContentEntry::new("Downward dog", &["Hands planted, hips up", "Even breathing 6-8 cycles"]),
            ContentEntry::new("Cobra", &["Lying down, hands under shoulders, gentle backbend", "5-8 breaths"]),
            ContentEntry::new("Child's pose", &["Sit back on the heels, forehead down", "Breathe into the back 1-2 minutes"]),
            ContentEntry::new("Warrior II", &["Wide stance, gaze forward", "5-8 breaths per side"]),
            ContentEntry::new("Boat pose", &["Seated, lean back, hold the center 20-40 s"]),
            ContentEntry::new("Chair pose", &["Knees back, arms up, 5-8 breaths"]),
            ContentEntry::new("Triangle", &["Reach one hand to the leg, open the chest", "5 breaths per side"]),
            ContentEntry::new("Half bridge", &["Lying down, lift the pelvis, 5-8 breaths"]),
            ContentEntry::new("Happy baby", &["Lying down, hold the feet, gentle stretch"]),
            ContentEntry::new("Pigeon (easy)", &["Knee forward, hips level, 1 min per side"]),
            ContentEntry::new("Cat-cow", &["On all fours, round and arch with the breath", "8-10 cycles"]),
            ContentEntry::new("Seated forward bend", &["Long spine, hinge from the hips", "6-8 breaths"]),
            ContentEntry::new("Supine twist", &["Knees to one side, shoulders down", "5 breaths per side"]),
            ContentEntry::new("Low lunge", &["Back knee down, hips forward", "5 breaths per side"]),
            ContentEntry::new("Sphinx", &["Forearms down, chest open", "1 minute"]),
            ContentEntry::new("Legs up the wall", &["Lie with legs resting on the wall", "3-5 minutes"]),
            ContentEntry::new("Garland squat", &["Deep squat, palms together", "5-8 breaths"]),
            ContentEntry::new("Savasana", &["Lie still, release every muscle", "3-5 minutes"]),
        ],
    }
}

fn nutrition() -> Topic {
    let tips = [
        "Start the day with a glass of water (250-300 ml).",
        "Add protein to every meal.",
        "Aim for 400 g of vegetables a day.",
        "One or two portions of fruit a day.",
        "Choose whole grains over refined ones.",
        "A portion of nuts is 20-30 g.",
        "Cut back on sugary drinks.",
        "Eat slowly; fullness arrives later.",
        "A protein breakfast keeps you full longer.",
        "Finish dinner 2-3 hours before sleep.",
        "Plan the menu 2-3 days ahead.",
        "Combine protein and vegetables in one dish.",
        "Fewer packaged snacks.",
        "A glass of water before a meal sometimes helps.",
        "Go easy on salt; use herbs and spices.",
        "Half the plate vegetables, a quarter protein, a quarter carbs.",
        "Limit fast food: many calories, few nutrients.",
        "After training have protein with carbs (yogurt and a banana).",
        "Eat fish once or twice a week.",
        "Legumes bring protein and fiber.",
        "Eat seasonal produce.",
        "Avoid late-night snacking.",
        "Snack on fruit, yogurt or nuts.",
        "Read the labels; shorter ingredient lists are better.",
        "Homemade sauces beat store-bought.",
        "Portion control helps weight loss.",
        "Drink tea or water without sugar.",
        "Cook and freeze portions for busy days.",
        "Variety makes any plan easier to keep.",
        "Rate hunger 1-10 and stop at 7-8.",
        "Prefer whole foods.",
        "Regular sleep supports appetite control.",
        "Alcohol adds calories and lowers self-control.",
        "Track trends, not daily weight.",
        "With a chronic condition, check changes with your doctor.",
    ];

    Topic {
        menu_label: "🥗 Nutrition".to_owned(),
        header: "🥗 Nutrition tips: simple and practical.".to_owned(),
        layout: Layout::Tips,
        default_count: 10,
        count_options: vec![5, 7, 10],
        entries: tips.iter().map(|tip| ContentEntry::tip(tip)).collect(),
    }
}

pub(super) fn lab_reference() -> BTreeMap<String, LabReference> {
    let labs = [
        ("hemoglobin", "Hemoglobin", "Women 120-150 g/L, men 130-170 g/L",
            "Carries oxygen. Low values cause fatigue and pallor.", "Check together with ferritin."),
        ("ferritin", "Ferritin", "Women 15-150 ng/mL, men 30-400 ng/mL",
            "Iron stores. Low ferritin often means fatigue and hair loss.", "Discuss supplementation with a doctor."),
        ("vitamin_d", "Vitamin D (25-OH)", "30-100 ng/mL",
            "Bones and immunity. Deficiency is common.", "Correct based on the test result."),
        ("b12", "Vitamin B12", "200-900 pg/mL",
            "Nervous system. Deficiency causes tingling and weakness.", "Vegans are at higher risk."),
        ("glucose", "Fasting glucose", "3.9-5.5 mmol/L",
            "Blood sugar marker.", "High values need follow-up."),
        ("hba1c", "HbA1c", "Below 5.7%",
            "Average glucose over 3 months.", "An important screening test."),
        ("alt", "ALT", "Up to 40 U/L",
            "Liver enzyme. Raised by alcohol, medication or fatty liver.", "Evaluate with AST."),
        ("ast", "AST", "Up to 40 U/L",
            "Liver and muscle enzyme.", "Evaluate together with ALT."),
        ("cholesterol", "Total cholesterol", "Below 5.2 mmol/L",
            "The LDL, HDL and triglyceride fractions matter most.", ""),
        ("ldl", "LDL", "Below 3.0 mmol/L",
            "\"Bad\" cholesterol. High levels raise cardiovascular risk.", ""),
        ("hdl", "HDL", "Above 1.0 mmol/L (men), 1.2 mmol/L (women)",
            "\"Good\" cholesterol. Higher is better.", ""),
        ("triglycerides", "Triglycerides", "Below 1.7 mmol/L",
            "Rise with excess sugar and alcohol.", ""),
        ("creatinine", "Creatinine", "Women 53-97 µmol/L, men 62-115 µmol/L",
            "Kidney marker.", "Evaluate together with eGFR."),
        ("crp", "C-reactive protein", "Below 5 mg/L",
            "Inflammation marker.", "High values point to inflammation."),
        ("tsh", "TSH", "0.4-4.0 mIU/L",
            "Thyroid screening.", "Follow up with free T4 if abnormal."),
        ("magnesium", "Magnesium", "0.66-1.07 mmol/L",
            "Muscles and nerves. Deficiency causes cramps.", ""),
        ("potassium", "Potassium", "3.5-5.1 mmol/L",
            "Heart rhythm. Deviations are dangerous.", "See a doctor for abnormal values."),
        ("insulin", "Fasting insulin", "2.6-24.9 µU/mL",
            "Used to assess insulin resistance.", ""),
    ];

    labs.into_iter()
        .map(|(code, name, norm, about, advice)| {
            (code.to_owned(), LabReference {
                name: name.to_owned(),
                norm: norm.to_owned(),
                about: about.to_owned(),
                advice: advice.to_owned(),
            })
        })
        .collect()
}

pub(super) fn recipes() -> Vec<Recipe> {
    fn owned(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| (*s).to_owned()).collect()
    }

    vec![
        Recipe {
            key: "oatmeal".to_owned(),
            title: "Oatmeal with berries".to_owned(),
            ingredients: owned(&["Rolled oats 50 g", "Milk or water 200 ml", "Berries 80 g", "Honey 1 tsp"]),
            steps: owned(&[
                "Bring the milk to a simmer.",
                "Add the oats and cook 5 minutes, stirring.",
                "Top with berries and honey.",
            ]),
            calories: Some(320),
            protein: Some(11.0),
            fat: Some(7.0),
            carbs: Some(52.0),
        },
        Recipe {
            key: "omelette".to_owned(),
            title: "Vegetable omelette".to_owned(),
            ingredients: owned(&["Eggs 2", "Bell pepper 1/2", "Spinach a handful", "Olive oil 1 tsp"]),
            steps: owned(&[
                "Whisk the eggs with a pinch of salt.",
                "Soften the pepper and spinach in the oil.",
                "Pour in the eggs and cook covered 4 minutes.",
            ]),
            calories: Some(240),
            protein: Some(15.0),
            fat: Some(17.0),
            carbs: Some(6.0),
        },
        Recipe {
            key: "chicken_salad".to_owned(),
            title: "Chicken and quinoa salad".to_owned(),
            ingredients: owned(&[
                "Chicken breast 120 g",
                "Cooked quinoa 100 g",
                "Cucumber 1",
                "Cherry tomatoes 6",
                "Lemon juice 1 tbsp",
            ]),
            steps: owned(&[
                "Grill the chicken and slice it.",
                "Chop the vegetables.",
                "Toss everything with quinoa and lemon juice.",
            ]),
            calories: Some(410),
            protein: Some(38.0),
            fat: Some(9.0),
            carbs: Some(42.0),
        },
        Recipe {
            key: "lentil_soup".to_owned(),
            title: "Red lentil soup".to_owned(),
            ingredients: owned(&["Red lentils 80 g", "Carrot 1", "Onion 1/2", "Cumin 1/2 tsp", "Water 600 ml"]),
            steps: owned(&[
                "Fry the onion and carrot until soft.",
                "Add lentils, cumin and water.",
                "Simmer 20 minutes and blend.",
            ]),
            calories: Some(330),
            protein: Some(19.0),
            fat: Some(4.0),
            carbs: Some(52.0),
        },
        Recipe {
            key: "yogurt_bowl".to_owned(),
            title: "Greek yogurt bowl".to_owned(),
            ingredients: owned(&["Greek yogurt 170 g", "Walnuts 15 g", "Apple 1/2", "Cinnamon a pinch"]),
            steps: owned(&["Dice the apple.", "Spoon the yogurt into a bowl and top with apple, nuts and cinnamon."]),
            calories: None,
            protein: None,
            fat: None,
            carbs: None,
        },
    ]
}
